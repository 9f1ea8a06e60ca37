//! The `/generate` pipeline: validate, authenticate, resolve parameters,
//! normalize markup, lay out blocks, render, encode.

use axum::http::StatusCode;

use crate::layout;
use crate::markup;
use crate::params::{OutputFormat, ResolvedParams};
use crate::render::{self, PlacedBlock};

use super::models::GenerateRequest;
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) error: String,
    pub(crate) details: Option<Vec<String>>,
}

impl ServerError {
    fn invalid_input(details: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid input".to_string(),
            details: Some(details),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: message.into(),
            details: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: message.into(),
            details: None,
        }
    }
}

pub(crate) struct RenderedImage {
    pub(crate) bytes: Vec<u8>,
    pub(crate) content_type: &'static str,
    pub(crate) attachment: Option<String>,
}

/// Runs the whole pipeline for one request. Synchronous and CPU-bound;
/// the handler wraps it in `spawn_blocking`.
pub(crate) fn generate_image(
    state: &ServerState,
    api_key: Option<&str>,
    payload: serde_json::Value,
) -> Result<RenderedImage, ServerError> {
    let request: GenerateRequest = serde_json::from_value(payload)
        .map_err(|err| ServerError::invalid_input(vec![err.to_string()]))?;
    let details = request.validate();
    if !details.is_empty() {
        return Err(ServerError::invalid_input(details));
    }
    check_api_key(state.settings.api_key.as_deref(), api_key)?;

    let params = ResolvedParams::resolve(request.into_raw(), &state.settings);
    let blocks = place_blocks(&params);
    let svg = render::render_svg(&params, &blocks, &state.fonts);
    let attachment = params
        .filename
        .as_deref()
        .and_then(|name| attachment_header(name, params.format));

    let bytes = match params.format {
        OutputFormat::Svg => svg.into_bytes(),
        format => render::rasterize(&svg, format, &state.fonts).map_err(|err| {
            tracing::error!("render failed: {:#}", err);
            ServerError::internal("Failed to render image")
        })?,
    };
    Ok(RenderedImage {
        bytes,
        content_type: params.format.content_type(),
        attachment,
    })
}

/// Rejects before any rendering work. With no key configured, every
/// request is rejected, matching a deployment that forgot to set one.
fn check_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), ServerError> {
    match (expected, provided) {
        (Some(expected), Some(provided)) if expected == provided => Ok(()),
        _ => Err(ServerError::forbidden("Forbidden: Invalid API key")),
    }
}

fn place_blocks(params: &ResolvedParams) -> Vec<PlacedBlock> {
    params
        .blocks
        .iter()
        .map(|block| {
            let lines = markup::normalize(&block.content);
            let layout = layout::compute(
                &block.position,
                block.font_size,
                params.width as f32,
                params.height as f32,
                lines.len(),
            );
            PlacedBlock {
                lines,
                layout,
                font_size: block.font_size,
            }
        })
        .collect()
}

fn attachment_header(name: &str, format: OutputFormat) -> Option<String> {
    let safe: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        .collect();
    if safe.is_empty() {
        return None;
    }
    Some(format!(
        "attachment; filename=\"{}.{}\"",
        safe,
        format.extension()
    ))
}
