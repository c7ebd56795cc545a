// ABOUTME: CLI argument definitions for the termpix binary
// ABOUTME: Maps command-line flags onto the pipeline's RenderConfig

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

use crate::pipeline::RenderConfig;
use crate::protocols::DisplayTarget;

#[derive(Parser, Debug)]
#[command(name = "termpix")]
#[command(about = "Display images in the terminal, with framebuffer fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Input image path or http(s) URL
    pub input: String,

    /// Resize dimensions as WIDTHxHEIGHT; a 0 derives that dimension
    /// from the aspect ratio (e.g. 800x600, 800x0)
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub resize: Option<String>,

    /// Scale factor applied after resizing (must be > 0)
    #[arg(long, default_value_t = 1.0)]
    pub scale_factor: f64,

    /// X position on the framebuffer
    #[arg(long, default_value_t = 0)]
    pub pos_x: u32,

    /// Y position on the framebuffer
    #[arg(long, default_value_t = 0)]
    pub pos_y: u32,

    /// Disable the safety feature that keeps the image in-bounds
    #[arg(long)]
    pub no_bounds: bool,

    /// Force a specific encoding (kitty, iterm2, sixel, ansi, framebuffer)
    #[arg(long, value_name = "ENCODING")]
    pub use_encoding: Option<DisplayTarget>,

    /// Terminal column width for the ANSI art fallback
    #[arg(long, default_value_t = 100)]
    pub columns: u32,

    /// Framebuffer device path
    #[arg(long, default_value = termpix_fb::DEFAULT_DEVICE)]
    pub fb_device: PathBuf,

    /// Enable verbose output for debugging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Validate the flags and build the pipeline configuration.
    pub fn render_config(&self) -> Result<RenderConfig> {
        let (resize_width, resize_height) = match &self.resize {
            Some(spec) => parse_resize(spec)?,
            None => (0, 0),
        };

        let config = RenderConfig {
            resize_width,
            resize_height,
            scale_factor: self.scale_factor,
            pos_x: self.pos_x,
            pos_y: self.pos_y,
            bounds_check: !self.no_bounds,
            forced_target: self.use_encoding,
            ansi_columns: self.columns,
            fb_device: self.fb_device.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse a WIDTHxHEIGHT resize specification.
pub fn parse_resize(spec: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = spec.split('x').collect();
    if parts.len() != 2 {
        return Err(anyhow!(
            "invalid resize format '{spec}'; use WIDTHxHEIGHT (e.g. 800x600)"
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow!("invalid resize width '{}'", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow!("invalid resize height '{}'", parts[1]))?;
    Ok((width, height))
}
