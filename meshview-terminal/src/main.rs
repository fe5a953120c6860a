/// Meshview Terminal - wireframe model viewer
///
/// Controls:
///   - Mouse drag / WASD / Arrow Keys: Orbit the camera
///   - Scroll / Z / X: Move closer or further
///   - +/-: Field of view
///   - Space: Pause the turntable
///   - R: Reset the camera
///   - Q/ESC: Quit
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use meshview_core::{ViewerConfig, CUBE_OBJ};
use meshview_terminal::{logging, TerminalApp};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "meshview", version, about = "Wireframe 3D model viewer for the terminal")]
struct Args {
    /// Model file (OBJ-style `v`/`f` records). Shows a cube when omitted.
    model: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured log level.
    #[arg(long, value_parser = logging::parse_level)]
    log_level: Option<meshview_core::config::LogLevel>,

    /// Log file (default `meshview.log`).
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.log_file.is_some() {
        config.logging.file = args.log_file.clone();
    }
    let log_path = logging::init_logger(&config.logging)?;
    info!(path = %log_path.display(), "logging started");

    let builder = config.mesh.builder();
    let mesh = match &args.model {
        Some(path) => builder
            .load(path)
            .with_context(|| format!("failed to load model {}", path.display()))?,
        None => {
            info!("no model given, showing the built-in cube");
            builder.build(CUBE_OBJ)?
        }
    };
    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "model ready"
    );

    let mut app = TerminalApp::new(mesh, &config)?;
    app.run()?;

    Ok(())
}
