/// Command-line configuration.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Render a Wavefront OBJ mesh in the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "objview-terminal", version, about)]
pub struct Args {
    /// OBJ file to load. A built-in cube is shown when omitted.
    pub obj: Option<PathBuf>,

    /// Target frames per second.
    #[arg(long, env = "OBJVIEW_FPS", default_value_t = 30)]
    pub fps: u32,

    #[arg(long, value_enum, default_value_t = ProjectionMode::Perspective)]
    pub projection: ProjectionMode,

    /// Vertical field of view in degrees (perspective only).
    #[arg(long, default_value_t = 45.0)]
    pub fov: f64,

    #[arg(long, default_value_t = 0.1)]
    pub near: f64,

    #[arg(long, default_value_t = 100.0)]
    pub far: f64,

    /// Distance from the camera to the mesh centre.
    #[arg(long, default_value_t = 3.0)]
    pub distance: f64,

    /// Print a single frame to stdout and exit.
    #[arg(long)]
    pub once: bool,

    /// Frame size for `--once`, as WIDTHxHEIGHT characters.
    #[arg(long, value_parser = parse_size, default_value = "80x40")]
    pub size: (u16, u16),
}

fn parse_size(value: &str) -> Result<(u16, u16), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width = width.parse::<u16>().map_err(|e| format!("invalid width: {e}"))?;
    let height = height.parse::<u16>().map_err(|e| format!("invalid height: {e}"))?;
    if width == 0 || height == 0 {
        return Err("size must be non-zero".to_string());
    }
    Ok((width, height))
}
