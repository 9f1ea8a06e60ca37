use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub api_key: Option<String>,
    pub max_dimension: u32,
    pub rate_window_secs: u64,
    pub rate_max_requests: u32,
    pub body_limit_bytes: usize,
    pub fonts_dir: PathBuf,
    pub font_stem: String,
    pub font_family: String,
    pub default_bg_color: String,
    pub default_text_color: String,
    pub default_font_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 4000,
            api_key: None,
            max_dimension: 2000,
            rate_window_secs: 60,
            rate_max_requests: 20,
            body_limit_bytes: 10 * 1024,
            fonts_dir: PathBuf::from("fonts"),
            font_stem: "bell-mt".to_string(),
            font_family: "Bell MT".to_string(),
            default_bg_color: "#000000".to_string(),
            default_text_color: "#ffffff".to_string(),
            default_font_size: 48,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    limits: Option<LimitSettings>,
    fonts: Option<FontSettings>,
    defaults: Option<DefaultSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    port: Option<u16>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitSettings {
    max_dimension: Option<u32>,
    rate_window_secs: Option<u64>,
    rate_max_requests: Option<u32>,
    body_limit_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    dir: Option<String>,
    stem: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultSettings {
    bg_color: Option<String>,
    text_color: Option<String>,
    font_size: Option<u32>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let default_file: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML)
        .with_context(|| "failed to parse built-in settings")?;
    settings.merge(default_file);

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    settings.apply_env();
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(port) = server.port {
                self.port = port;
            }
            if let Some(key) = server.api_key {
                if !key.trim().is_empty() {
                    self.api_key = Some(key);
                }
            }
        }
        if let Some(limits) = incoming.limits {
            if let Some(max) = limits.max_dimension {
                if max > 0 {
                    self.max_dimension = max;
                }
            }
            if let Some(window) = limits.rate_window_secs {
                if window > 0 {
                    self.rate_window_secs = window;
                }
            }
            if let Some(max) = limits.rate_max_requests {
                if max > 0 {
                    self.rate_max_requests = max;
                }
            }
            if let Some(limit) = limits.body_limit_bytes {
                if limit > 0 {
                    self.body_limit_bytes = limit;
                }
            }
        }
        if let Some(fonts) = incoming.fonts {
            if let Some(dir) = fonts.dir {
                if !dir.trim().is_empty() {
                    self.fonts_dir = PathBuf::from(dir);
                }
            }
            if let Some(stem) = fonts.stem {
                if !stem.trim().is_empty() {
                    self.font_stem = stem;
                }
            }
            if let Some(family) = fonts.family {
                if !family.trim().is_empty() {
                    self.font_family = family;
                }
            }
        }
        if let Some(defaults) = incoming.defaults {
            if let Some(color) = defaults.bg_color {
                if !color.trim().is_empty() {
                    self.default_bg_color = color;
                }
            }
            if let Some(color) = defaults.text_color {
                if !color.trim().is_empty() {
                    self.default_text_color = color;
                }
            }
            if let Some(size) = defaults.font_size {
                if size > 0 {
                    self.default_font_size = size;
                }
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.trim().parse::<u16>() {
                self.port = port;
            }
        }
    }
}
