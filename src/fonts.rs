//! Process-wide font set: three faces (regular, bold, italic) read once at
//! startup, shared read-only behind `Arc` for the life of the process.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::Path;
use std::sync::Arc;
use ttf_parser::{Face, name_id};
use usvg::fontdb;

use crate::settings::Settings;

#[derive(Clone)]
struct FontFace {
    data: Vec<u8>,
    encoded: String,
}

impl FontFace {
    fn new(data: Vec<u8>) -> Self {
        let encoded = BASE64.encode(&data);
        Self { data, encoded }
    }
}

#[derive(Clone)]
pub struct FontSet {
    family: String,
    regular: FontFace,
    bold: FontFace,
    italic: FontFace,
    db: Arc<fontdb::Database>,
}

impl FontSet {
    /// Builds a set from raw TTF bytes without validating them. Corrupt
    /// data is caught either by [`FontSet::load`] at startup or by the
    /// font database, which skips unparseable faces.
    pub fn from_data(family: &str, regular: Vec<u8>, bold: Vec<u8>, italic: Vec<u8>) -> Self {
        let regular = FontFace::new(regular);
        let bold = FontFace::new(bold);
        let italic = FontFace::new(italic);
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        db.load_font_data(regular.data.clone());
        db.load_font_data(bold.data.clone());
        db.load_font_data(italic.data.clone());
        Self {
            family: family.to_string(),
            regular,
            bold,
            italic,
            db: Arc::new(db),
        }
    }

    /// Reads `<stem>.ttf`, `<stem>-bold.ttf` and `<stem>-italic.ttf` from
    /// the configured fonts directory and validates each face. The family
    /// name is taken from the regular face when it carries one.
    pub fn load(settings: &Settings) -> Result<Self> {
        let dir = settings.fonts_dir.as_path();
        let regular = read_face(dir, &format!("{}.ttf", settings.font_stem))?;
        let bold = read_face(dir, &format!("{}-bold.ttf", settings.font_stem))?;
        let italic = read_face(dir, &format!("{}-italic.ttf", settings.font_stem))?;
        let family = face_family(&regular).unwrap_or_else(|| settings.font_family.clone());
        Ok(Self::from_data(&family, regular, bold, italic))
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// The `<style>` element embedding all three faces as base64 data URIs,
    /// so an SVG response is portable without external font files.
    pub fn style_block(&self) -> String {
        let face = |encoded: &str, weight: &str, style: &str| {
            format!(
                concat!(
                    "@font-face {{ font-family: \"{family}\"; ",
                    "src: url(\"data:font/ttf;base64,{data}\") format(\"truetype\"); ",
                    "font-weight: {weight}; font-style: {style}; }}"
                ),
                family = self.family,
                data = encoded,
                weight = weight,
                style = style,
            )
        };
        format!(
            "<style>\n{}\n{}\n{}\n</style>",
            face(&self.regular.encoded, "normal", "normal"),
            face(&self.bold.encoded, "bold", "normal"),
            face(&self.italic.encoded, "normal", "italic"),
        )
    }

    /// Font database for rasterization: the three loaded faces plus any
    /// system fonts as fallback. Built once at construction and shared
    /// read-only across concurrent requests.
    pub fn fontdb(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }
}

fn read_face(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    let data = std::fs::read(&path)
        .with_context(|| format!("failed to read font: {}", path.display()))?;
    Face::parse(&data, 0).map_err(|err| anyhow!("invalid font {}: {}", path.display(), err))?;
    Ok(data)
}

fn face_family(data: &[u8]) -> Option<String> {
    let face = Face::parse(data, 0).ok()?;
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
