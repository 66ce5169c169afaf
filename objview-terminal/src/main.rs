/// objview terminal viewer
///
/// Renders an OBJ mesh (or a built-in cube) with the ASCII rasterizer.
/// Controls:
///   - WASD / Arrow Keys: Rotate the mesh
///   - E/R: Roll rotation
///   - Q/ESC: Quit
use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use objview_core::obj;
use objview_terminal::{logging, render_frame, Args, TerminalApp, CUBE_OBJ};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging();

    let src = match &args.obj {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => CUBE_OBJ.to_string(),
    };

    if args.once {
        print!("{}", render_frame(&src, &args)?);
        return Ok(());
    }

    let geometry = obj::parse(&src).context("Failed to parse OBJ")?;
    info!("Starting terminal renderer (press Q to quit)");
    TerminalApp::new(&geometry, args)?.run()
}
