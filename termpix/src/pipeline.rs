// ABOUTME: Canonical render pipeline from decoded image to terminal or framebuffer
// ABOUTME: Applies transforms, selects an output protocol, and handles fallback

use std::io::{Cursor, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbaImage};

use crate::ansi::{self, RandomGlyphs};
use crate::protocols::{iterm2, kitty, sixel, DisplayTarget, TerminalCapabilities};
use crate::{quantize, transform};

const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";

/// Terminal dimensions assumed when neither the framebuffer nor the
/// terminal can report a size.
const DEFAULT_BOUNDS: (u32, u32) = (80, 24);

/// Everything one render call needs. Built once by the caller and never
/// mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Resize target; 0 in one dimension derives it from the aspect
    /// ratio, 0 in both skips resizing.
    pub resize_width: u32,
    pub resize_height: u32,
    /// Scale factor applied after resizing; must be > 0, 1.0 is identity.
    pub scale_factor: f64,
    /// Draw position, framebuffer target only.
    pub pos_x: u32,
    pub pos_y: u32,
    /// Fit the image to the display bounds before encoding.
    pub bounds_check: bool,
    /// Skip capability probing and use this target unconditionally.
    pub forced_target: Option<DisplayTarget>,
    /// Column width of the ANSI glyph fallback.
    pub ansi_columns: u32,
    /// Framebuffer device path.
    pub fb_device: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resize_width: 0,
            resize_height: 0,
            scale_factor: 1.0,
            pos_x: 0,
            pos_y: 0,
            bounds_check: true,
            forced_target: None,
            ansi_columns: 100,
            fb_device: PathBuf::from(termpix_fb::DEFAULT_DEVICE),
        }
    }
}

impl RenderConfig {
    /// Reject configurations the pipeline must never run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor > 0.0) || !self.scale_factor.is_finite() {
            return Err(anyhow!(
                "scale factor must be a positive number, got {}",
                self.scale_factor
            ));
        }
        Ok(())
    }
}

/// Render a decoded image to the terminal, falling back to the
/// framebuffer device when the terminal path fails.
///
/// The image is resized, scaled, and bounds-fitted per the config, then
/// encoded for the forced or probed [`DisplayTarget`]. A terminal
/// protocol failure at the I/O level is not fatal: the pipeline hides
/// the cursor, blits to the framebuffer, shows the cursor again, and
/// reports only the blit's own result.
pub fn display_image(img: &RgbaImage, config: &RenderConfig, out: &mut dyn Write) -> Result<()> {
    config.validate()?;

    let mut img = if config.resize_width > 0 || config.resize_height > 0 {
        transform::resize(img, config.resize_width, config.resize_height)
    } else {
        img.clone()
    };

    img = transform::scale(&img, config.scale_factor);

    if config.bounds_check {
        let (max_w, max_h) = display_bounds(config);
        img = transform::fit_to_bounds(&img, max_w, max_h);
    }

    let target = match config.forced_target {
        Some(target) => {
            log::debug!("using forced target {target}");
            target
        }
        None => {
            let caps = TerminalCapabilities::detect();
            let target = caps.preferred_target();
            log::debug!("terminal '{}' selected target {target}", caps.terminal_name);
            target
        }
    };

    if target == DisplayTarget::Framebuffer {
        return blit_with_cursor_guard(&img, config, out);
    }

    match encode_for_terminal(&img, target, config)
        .and_then(|payload| write_payload(out, &payload))
    {
        Ok(()) => Ok(()),
        Err(e) => {
            log::warn!("{target} output failed ({e:#}); falling back to framebuffer");
            blit_with_cursor_guard(&img, config, out)
        }
    }
}

/// Produce the escape-sequence payload for a terminal target.
fn encode_for_terminal(
    img: &RgbaImage,
    target: DisplayTarget,
    config: &RenderConfig,
) -> Result<String> {
    match target {
        DisplayTarget::Kitty => kitty::encode(&png_bytes(img)?),
        DisplayTarget::Iterm2 => Ok(iterm2::encode(&png_bytes(img)?, "image.png")),
        DisplayTarget::Sixel => Ok(sixel::encode(&quantize::quantize(img))),
        DisplayTarget::Ansi => Ok(ansi::render(
            img,
            config.ansi_columns,
            &mut RandomGlyphs::new(),
        )),
        DisplayTarget::Framebuffer => Err(anyhow!("framebuffer is not a terminal target")),
    }
}

fn write_payload(out: &mut dyn Write, payload: &str) -> Result<()> {
    out.write_all(payload.as_bytes())
        .context("failed to write to terminal")?;
    out.flush().context("failed to flush terminal output")?;
    Ok(())
}

// Kitty and iTerm2 both accept PNG payloads.
fn png_bytes(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .context("failed to encode image as PNG")?;
    Ok(buffer)
}

// The cursor escapes bracket the blit no matter how it goes; their own
// write errors are ignored since the terminal may already be gone.
fn blit_with_cursor_guard(
    img: &RgbaImage,
    config: &RenderConfig,
    out: &mut dyn Write,
) -> Result<()> {
    let _ = out.write_all(CURSOR_HIDE.as_bytes());
    let _ = out.flush();

    let result = termpix_fb::draw_scaled_image_at(
        img,
        config.pos_x,
        config.pos_y,
        config.scale_factor,
        &config.fb_device,
    )
    .context("error drawing on framebuffer");

    let _ = out.write_all(CURSOR_SHOW.as_bytes());
    let _ = out.flush();

    result
}

// Bounds for fitting: the framebuffer geometry when a device is there,
// otherwise the terminal size in cells, otherwise 80x24.
fn display_bounds(config: &RenderConfig) -> (u32, u32) {
    if let Ok(geometry) = termpix_fb::probe_geometry(&config.fb_device) {
        return (geometry.width as u32, geometry.height as u32);
    }
    match crossterm::terminal::size() {
        Ok((cols, rows)) => (cols as u32, rows as u32),
        Err(_) => DEFAULT_BOUNDS,
    }
}
