use serde::{Deserialize, Serialize};

use crate::params::{OutputFormat, Placement, Position, RawBlock, RawParams};

const MIN_DIMENSION: u32 = 1;
const MAX_DIMENSION: u32 = 2000;
const MAX_FONT_SIZE: u32 = 200;
const MAX_CONTENT_CHARS: usize = 1000;

/// Wire shape of `POST /generate`. Two text shapes are accepted: a
/// `texts` array with per-item coordinates, or a single `text` string
/// with a named `placement`. Both map onto the same internal block model.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    pub(crate) bg_color: Option<String>,
    pub(crate) text_color: Option<String>,
    pub(crate) font_size: Option<u32>,
    pub(crate) font_family: Option<String>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) format: Option<OutputFormat>,
    pub(crate) filename: Option<String>,
    pub(crate) texts: Option<Vec<TextItem>>,
    pub(crate) text: Option<String>,
    pub(crate) placement: Option<Placement>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct TextItem {
    pub(crate) content: String,
    pub(crate) font_size: Option<u32>,
    pub(crate) x: Option<String>,
    pub(crate) y: Option<String>,
}

impl GenerateRequest {
    /// Schema bounds check. Returns one detail string per violated field;
    /// an empty list means the request is valid.
    pub(crate) fn validate(&self) -> Vec<String> {
        let mut details = Vec::new();
        match self.width {
            None => details.push("width: is required".to_string()),
            Some(value) if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) => {
                details.push(format!(
                    "width: must be between {} and {}",
                    MIN_DIMENSION, MAX_DIMENSION
                ));
            }
            _ => {}
        }
        match self.height {
            None => details.push("height: is required".to_string()),
            Some(value) if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) => {
                details.push(format!(
                    "height: must be between {} and {}",
                    MIN_DIMENSION, MAX_DIMENSION
                ));
            }
            _ => {}
        }
        if let Some(color) = self.bg_color.as_deref() {
            if !is_hex_color(color) {
                details.push("bgColor: must match #RRGGBB".to_string());
            }
        }
        if let Some(color) = self.text_color.as_deref() {
            if !is_hex_color(color) {
                details.push("textColor: must match #RRGGBB".to_string());
            }
        }
        if let Some(size) = self.font_size {
            if !(1..=MAX_FONT_SIZE).contains(&size) {
                details.push(format!("fontSize: must be between 1 and {}", MAX_FONT_SIZE));
            }
        }
        if self.text.is_some() && self.texts.is_some() {
            details.push("text and texts cannot be provided together".to_string());
        }
        if let Some(text) = self.text.as_deref() {
            if !(1..=MAX_CONTENT_CHARS).contains(&text.chars().count()) {
                details.push(format!(
                    "text: must be between 1 and {} characters",
                    MAX_CONTENT_CHARS
                ));
            }
        }
        if let Some(items) = self.texts.as_deref() {
            for (index, item) in items.iter().enumerate() {
                if !(1..=MAX_CONTENT_CHARS).contains(&item.content.chars().count()) {
                    details.push(format!(
                        "texts[{}].content: must be between 1 and {} characters",
                        index, MAX_CONTENT_CHARS
                    ));
                }
                if let Some(size) = item.font_size {
                    if !(1..=MAX_FONT_SIZE).contains(&size) {
                        details.push(format!(
                            "texts[{}].fontSize: must be between 1 and {}",
                            index, MAX_FONT_SIZE
                        ));
                    }
                }
            }
        }
        details
    }

    /// Folds both wire shapes into the unified block model. Only valid
    /// requests reach this point.
    pub(crate) fn into_raw(self) -> RawParams {
        let blocks = if let Some(items) = self.texts {
            items
                .into_iter()
                .map(|item| RawBlock {
                    content: item.content,
                    font_size: item.font_size,
                    position: Position::Explicit {
                        x: item.x.unwrap_or_else(|| "50%".to_string()),
                        y: item.y.unwrap_or_else(|| "50%".to_string()),
                    },
                })
                .collect()
        } else if let Some(text) = self.text {
            vec![RawBlock {
                content: text,
                font_size: None,
                position: Position::Anchor(self.placement.unwrap_or(Placement::Center)),
            }]
        } else {
            Vec::new()
        };
        RawParams {
            width: self.width.unwrap_or(MIN_DIMENSION),
            height: self.height.unwrap_or(MIN_DIMENSION),
            bg_color: self.bg_color,
            text_color: self.text_color,
            font_family: self.font_family,
            font_size: self.font_size,
            format: self.format,
            filename: self.filename,
            blocks,
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|ch| ch.is_ascii_hexdigit())
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateRequest {
        serde_json::from_value(value).expect("deserialize")
    }

    #[test]
    fn minimal_request_is_valid() {
        let request = parse(json!({ "width": 800, "height": 400 }));
        assert!(request.validate().is_empty());
        let raw = request.into_raw();
        assert_eq!(raw.width, 800);
        assert!(raw.blocks.is_empty());
    }

    #[test]
    fn out_of_range_dimensions_are_reported_per_field() {
        let request = parse(json!({ "width": 0, "height": 5000 }));
        let details = request.validate();
        assert_eq!(details.len(), 2);
        assert!(details[0].starts_with("width:"));
        assert!(details[1].starts_with("height:"));
    }

    #[test]
    fn missing_dimensions_are_required() {
        let request = parse(json!({}));
        let details = request.validate();
        assert!(details.contains(&"width: is required".to_string()));
        assert!(details.contains(&"height: is required".to_string()));
    }

    #[test]
    fn color_format_is_checked() {
        let request = parse(json!({
            "width": 10, "height": 10,
            "bgColor": "red", "textColor": "#12345g"
        }));
        let details = request.validate();
        assert!(details.iter().any(|d| d.starts_with("bgColor:")));
        assert!(details.iter().any(|d| d.starts_with("textColor:")));

        let request = parse(json!({
            "width": 10, "height": 10,
            "bgColor": "#1A2b3C", "textColor": "#ffffff"
        }));
        assert!(request.validate().is_empty());
    }

    #[test]
    fn both_text_shapes_together_are_rejected() {
        let request = parse(json!({
            "width": 10, "height": 10,
            "text": "a", "texts": [{ "content": "b" }]
        }));
        let details = request.validate();
        assert!(
            details
                .iter()
                .any(|d| d.contains("cannot be provided together"))
        );
    }

    #[test]
    fn content_length_bounds() {
        let request = parse(json!({
            "width": 10, "height": 10,
            "texts": [{ "content": "" }, { "content": "x".repeat(1001) }]
        }));
        let details = request.validate();
        assert!(details.iter().any(|d| d.starts_with("texts[0].content")));
        assert!(details.iter().any(|d| d.starts_with("texts[1].content")));
    }

    #[test]
    fn texts_items_become_explicit_blocks_with_default_coordinates() {
        let request = parse(json!({
            "width": 10, "height": 10,
            "texts": [{ "content": "a", "x": "10", "fontSize": 12 }]
        }));
        let raw = request.into_raw();
        assert_eq!(raw.blocks.len(), 1);
        assert_eq!(raw.blocks[0].font_size, Some(12));
        assert_eq!(
            raw.blocks[0].position,
            Position::Explicit {
                x: "10".to_string(),
                y: "50%".to_string()
            }
        );
    }

    #[test]
    fn single_text_becomes_an_anchored_block() {
        let request = parse(json!({
            "width": 10, "height": 10,
            "text": "hello", "placement": "bottom-right"
        }));
        let raw = request.into_raw();
        assert_eq!(
            raw.blocks[0].position,
            Position::Anchor(Placement::BottomRight)
        );

        let request = parse(json!({ "width": 10, "height": 10, "text": "hello" }));
        let raw = request.into_raw();
        assert_eq!(raw.blocks[0].position, Position::Anchor(Placement::Center));
    }

    #[test]
    fn unknown_format_fails_deserialization() {
        let result: Result<GenerateRequest, _> = serde_json::from_value(json!({
            "width": 10, "height": 10, "format": "bmp"
        }));
        assert!(result.is_err());
    }
}
