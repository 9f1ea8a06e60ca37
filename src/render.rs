//! Turns normalized text plus computed layout into the output image.
//!
//! The document is always assembled in vector space first. PNG and JPEG
//! responses rasterize that same document at its declared size; format
//! conversion never re-runs layout.

use anyhow::{Context, Result, anyhow};
use resvg::render;
use std::io::Cursor;
use tiny_skia::Pixmap;
use usvg::{Options, Tree};

use crate::fonts::FontSet;
use crate::layout::LayoutResult;
use crate::markup::NormalizedLine;
use crate::params::{OutputFormat, ResolvedParams};

/// One text block ready to draw: its normalized lines and where they go.
pub struct PlacedBlock {
    pub lines: Vec<NormalizedLine>,
    pub layout: LayoutResult,
    pub font_size: f32,
}

/// Emits the self-contained SVG document: embedded fonts, background
/// rectangle, one `<text>` element per block. Identical input produces
/// byte-identical output.
pub fn render_svg(params: &ResolvedParams, blocks: &[PlacedBlock], fonts: &FontSet) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
        w = params.width,
        h = params.height
    ));
    svg.push('\n');
    svg.push_str(&fonts.style_block());
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="100%" height="100%" fill="{fill}"/>"#,
        fill = params.bg_color
    ));
    for block in blocks {
        svg.push('\n');
        push_text_element(&mut svg, block, params);
    }
    svg.push_str("\n</svg>");
    svg
}

fn push_text_element(svg: &mut String, block: &PlacedBlock, params: &ResolvedParams) {
    let layout = &block.layout;
    svg.push_str(&format!(
        r#"<text x="{x}" y="{y}" text-anchor="{anchor}" fill="{fill}" font-family="{family}" font-size="{size}""#,
        x = layout.x,
        y = layout.y,
        anchor = layout.align.text_anchor(),
        fill = params.text_color,
        family = escape_xml(&params.font_family),
        size = block.font_size
    ));
    if layout.middle_baseline {
        svg.push_str(r#" dominant-baseline="middle""#);
    }
    svg.push('>');
    for (index, line) in block.lines.iter().enumerate() {
        if index == 0 {
            push_runs(svg, line);
        } else {
            svg.push_str(&format!(
                r#"<tspan x="{x}" dy="{dy}">"#,
                x = layout.x,
                dy = layout.line_height
            ));
            push_runs(svg, line);
            svg.push_str("</tspan>");
        }
    }
    svg.push_str("</text>");
}

fn push_runs(svg: &mut String, line: &NormalizedLine) {
    for run in &line.runs {
        let escaped = escape_xml(&run.text);
        match (run.bold, run.italic) {
            (false, false) => svg.push_str(&escaped),
            (true, false) => {
                svg.push_str(&format!(
                    r#"<tspan font-weight="bold">{}</tspan>"#,
                    escaped
                ));
            }
            (false, true) => {
                svg.push_str(&format!(
                    r#"<tspan font-style="italic">{}</tspan>"#,
                    escaped
                ));
            }
            (true, true) => {
                svg.push_str(&format!(
                    r#"<tspan font-weight="bold" font-style="italic">{}</tspan>"#,
                    escaped
                ));
            }
        }
    }
}

/// Rasterizes the vector document at its declared size and encodes it in
/// the requested format. Fails atomically: either the full byte buffer or
/// an error, never partial output.
pub fn rasterize(svg: &str, format: OutputFormat, fonts: &FontSet) -> Result<Vec<u8>> {
    let image_format = match format {
        OutputFormat::Png => image::ImageFormat::Png,
        OutputFormat::Jpeg => image::ImageFormat::Jpeg,
        OutputFormat::Svg => return Err(anyhow!("svg is not a raster format")),
    };
    let options = Options {
        fontdb: fonts.fontdb(),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG document")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty canvas size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let rgba = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer"))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    match image_format {
        // JPEG has no alpha channel
        image::ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .write_to(&mut cursor, image_format)
            .with_context(|| "failed to encode image")?,
        _ => image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut cursor, image_format)
            .with_context(|| "failed to encode image")?,
    }
    Ok(bytes)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
