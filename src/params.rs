//! Fully-resolved rendering parameters.
//!
//! The wire request ([`crate::server`]) merges into this immutable struct
//! exactly once, before any layout work: global defaults, then request
//! values, then per-block overrides. Width and height are clamped to the
//! deployment's `max_dimension` here; downstream code never re-clamps.

use serde::Deserialize;

use crate::settings::Settings;

/// Output image format. `jpg` is accepted on the wire as an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Named placement anchor for the single-text request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Where a block is anchored. Explicit coordinates are kept verbatim
/// (they may be percentage strings like `"50%"`) and flow straight into
/// the vector document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Explicit { x: String, y: String },
    Anchor(Placement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub font_size: f32,
    pub position: Position,
}

/// Immutable, fully-merged input to layout and rendering.
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    pub width: u32,
    pub height: u32,
    pub bg_color: String,
    pub text_color: String,
    pub font_family: String,
    pub format: OutputFormat,
    pub filename: Option<String>,
    pub blocks: Vec<TextBlock>,
}

pub struct RawParams {
    pub width: u32,
    pub height: u32,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    pub format: Option<OutputFormat>,
    pub filename: Option<String>,
    pub blocks: Vec<RawBlock>,
}

pub struct RawBlock {
    pub content: String,
    pub font_size: Option<u32>,
    pub position: Position,
}

impl ResolvedParams {
    /// The single defaults-merge point: settings defaults, request-level
    /// values, then per-block font-size overrides.
    pub fn resolve(raw: RawParams, settings: &Settings) -> Self {
        let default_font_size = raw.font_size.unwrap_or(settings.default_font_size);
        let blocks = raw
            .blocks
            .into_iter()
            .map(|block| TextBlock {
                content: block.content,
                font_size: block.font_size.unwrap_or(default_font_size) as f32,
                position: block.position,
            })
            .collect();
        Self {
            width: raw.width.min(settings.max_dimension),
            height: raw.height.min(settings.max_dimension),
            bg_color: raw
                .bg_color
                .unwrap_or_else(|| settings.default_bg_color.clone()),
            text_color: raw
                .text_color
                .unwrap_or_else(|| settings.default_text_color.clone()),
            font_family: raw
                .font_family
                .unwrap_or_else(|| settings.font_family.clone()),
            format: raw.format.unwrap_or(OutputFormat::Svg),
            filename: raw.filename,
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(width: u32, height: u32) -> RawParams {
        RawParams {
            width,
            height,
            bg_color: None,
            text_color: None,
            font_family: None,
            font_size: None,
            format: None,
            filename: None,
            blocks: Vec::new(),
        }
    }

    #[test]
    fn settings_defaults_fill_missing_values() {
        let params = ResolvedParams::resolve(raw(800, 400), &Settings::default());
        assert_eq!(params.bg_color, "#000000");
        assert_eq!(params.text_color, "#ffffff");
        assert_eq!(params.font_family, "Bell MT");
        assert_eq!(params.format, OutputFormat::Svg);
        assert!(params.blocks.is_empty());
    }

    #[test]
    fn block_font_size_falls_back_to_request_then_settings() {
        let mut input = raw(800, 400);
        input.blocks = vec![
            RawBlock {
                content: "a".to_string(),
                font_size: Some(12),
                position: Position::Anchor(Placement::Center),
            },
            RawBlock {
                content: "b".to_string(),
                font_size: None,
                position: Position::Anchor(Placement::Center),
            },
        ];
        let params = ResolvedParams::resolve(input, &Settings::default());
        assert_eq!(params.blocks[0].font_size, 12.0);
        assert_eq!(params.blocks[1].font_size, 48.0);

        let mut input = raw(800, 400);
        input.font_size = Some(30);
        input.blocks = vec![RawBlock {
            content: "c".to_string(),
            font_size: None,
            position: Position::Anchor(Placement::Center),
        }];
        let params = ResolvedParams::resolve(input, &Settings::default());
        assert_eq!(params.blocks[0].font_size, 30.0);
    }

    #[test]
    fn dimensions_clamp_to_deployment_maximum() {
        let mut settings = Settings::default();
        settings.max_dimension = 1000;
        let params = ResolvedParams::resolve(raw(1600, 900), &settings);
        assert_eq!(params.width, 1000);
        assert_eq!(params.height, 900);
    }

    #[test]
    fn jpg_alias_maps_to_jpeg() {
        let format: OutputFormat = serde_json::from_str("\"jpg\"").expect("parse");
        assert_eq!(format, OutputFormat::Jpeg);
        assert_eq!(format.content_type(), "image/jpeg");
        let format: OutputFormat = serde_json::from_str("\"jpeg\"").expect("parse");
        assert_eq!(format.content_type(), "image/jpeg");
    }
}
