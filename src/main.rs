use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use og_image_server::{fonts, logging, server, settings};

#[derive(Parser, Debug)]
#[command(
    name = "og-image-server",
    version,
    about = "Render text descriptions into SVG/PNG/JPEG images over HTTP"
)]
struct Cli {
    /// Listening port (overrides settings and the PORT env variable)
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Directory containing the three font faces (regular/bold/italic)
    #[arg(long = "fonts-dir")]
    fonts_dir: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let settings_path = cli.read_settings.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(dir) = cli.fonts_dir {
        settings.fonts_dir = dir;
    }

    let fonts = fonts::FontSet::load(&settings)?;
    tracing::info!("loaded font family \"{}\"", fonts.family());

    server::run_server(settings, fonts).await
}
