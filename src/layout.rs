//! Computes where each text block sits on the canvas.
//!
//! Explicit coordinates pass through verbatim (percentage strings
//! included) and anchor at the given point with a middle baseline. Named
//! placements resolve to one of five fixed corner/center layouts. Width
//! and height here are already clamped by parameter resolution.

use crate::params::{Placement, Position};

pub const PADDING: f32 = 20.0;
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Horizontal alignment expressed in SVG `text-anchor` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Middle,
    End,
}

impl Align {
    pub fn text_anchor(self) -> &'static str {
        match self {
            Align::Start => "start",
            Align::Middle => "middle",
            Align::End => "end",
        }
    }
}

/// Placement of a block's first line. `x`/`y` are strings because explicit
/// coordinates are carried verbatim into the vector document; anchor
/// coordinates are formatted numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub x: String,
    pub y: String,
    pub align: Align,
    pub line_height: f32,
    /// Vertically center the glyphs on the anchor point (explicit mode).
    pub middle_baseline: bool,
}

pub fn compute(
    position: &Position,
    font_size: f32,
    canvas_width: f32,
    canvas_height: f32,
    line_count: usize,
) -> LayoutResult {
    let line_height = font_size * LINE_HEIGHT_FACTOR;
    match position {
        Position::Explicit { x, y } => LayoutResult {
            x: x.clone(),
            y: y.clone(),
            align: Align::Start,
            line_height,
            middle_baseline: true,
        },
        Position::Anchor(placement) => {
            let total_height = line_count as f32 * line_height;
            let (x, y, align) = match placement {
                Placement::Center => (
                    canvas_width / 2.0,
                    (canvas_height - total_height) / 2.0 + font_size,
                    Align::Middle,
                ),
                Placement::TopLeft => (PADDING, PADDING + font_size, Align::Start),
                Placement::TopRight => (canvas_width - PADDING, PADDING + font_size, Align::End),
                Placement::BottomLeft => (
                    PADDING,
                    canvas_height - total_height - PADDING + font_size,
                    Align::Start,
                ),
                Placement::BottomRight => (
                    canvas_width - PADDING,
                    canvas_height - total_height - PADDING + font_size,
                    Align::End,
                ),
            };
            LayoutResult {
                x: fmt_coord(x),
                y: fmt_coord(y),
                align,
                line_height,
                middle_baseline: false,
            }
        }
    }
}

fn fmt_coord(value: f32) -> String {
    value.to_string()
}
