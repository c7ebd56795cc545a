// ABOUTME: ANSI-art text renderer mapping pixels to 256-color glyphs
// ABOUTME: Emits run-length compressed color escapes with a textured glyph fill

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::transform;

/// Terminal character cells are taller than wide; rows are reduced by
/// this factor so the rendered image keeps its proportions.
const CELL_ASPECT: f64 = 0.46;

/// Glyphs used for the textured fill. Which one is picked per pixel is
/// up to the [`GlyphSource`]; only the color carries information.
const GLYPH_ALPHABET: [char; 6] = ['#', '%', '*', '+', '=', '@'];

const RESET: &str = "\x1b[0m";

// Color cube codes start above the 16 base colors; 6 levels per channel
// give 216 entries. The cube origin doubles as the near-black sentinel.
const CUBE_OFFSET: u16 = 16;

/// Supplies the glyph for each non-blank cell.
///
/// Production rendering uses [`RandomGlyphs`]; tests can supply a
/// deterministic source to make output byte-stable.
pub trait GlyphSource {
    fn pick(&mut self, alphabet: &[char]) -> char;
}

/// Pseudo-random glyph selection. Not reproducible across runs, which is
/// acceptable: the glyphs are a visual texture, not data.
pub struct RandomGlyphs {
    rng: rand::rngs::ThreadRng,
}

impl RandomGlyphs {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for RandomGlyphs {
    fn pick(&mut self, alphabet: &[char]) -> char {
        alphabet[self.rng.gen_range(0..alphabet.len())]
    }
}

/// Cycles through the alphabet in order. Deterministic, for tests and
/// embedders that need byte-stable output.
pub struct SequentialGlyphs {
    next: usize,
}

impl SequentialGlyphs {
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl Default for SequentialGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for SequentialGlyphs {
    fn pick(&mut self, alphabet: &[char]) -> char {
        let glyph = alphabet[self.next % alphabet.len()];
        self.next += 1;
        glyph
    }
}

/// Render an image as colored terminal glyphs, `columns` characters wide.
///
/// The row count follows from the image's aspect ratio compensated by
/// [`CELL_ASPECT`]. Each pixel becomes one glyph; the color escape is
/// emitted only when the pixel's color code differs from the previous
/// pixel's. Near-black pixels map to a reset-plus-space so dark regions
/// stay unfilled. Every row ends with a newline and the whole output
/// ends with a reset sequence.
pub fn render(img: &RgbaImage, columns: u32, glyphs: &mut dyn GlyphSource) -> String {
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 || columns == 0 {
        return RESET.to_string();
    }

    let rows = (columns as f64 * (src_h as f64 / src_w as f64) * CELL_ASPECT) as u32;
    let resized = transform::resize(img, columns, rows);

    let mut out = String::new();
    let mut last_code: Option<u16> = None;

    for y in 0..resized.height() {
        for x in 0..resized.width() {
            let code = cube_code(resized.get_pixel(x, y));
            if last_code != Some(code) {
                if code == CUBE_OFFSET {
                    out.push_str(RESET);
                } else {
                    out.push_str(&format!("\x1b[38;5;{code}m"));
                }
                last_code = Some(code);
            }
            if code == CUBE_OFFSET {
                out.push(' ');
            } else {
                out.push(glyphs.pick(&GLYPH_ALPHABET));
            }
        }
        out.push('\n');
    }

    out.push_str(RESET);
    out
}

/// Render with the production pseudo-random glyph source.
pub fn render_random(img: &RgbaImage, columns: u32) -> String {
    render(img, columns, &mut RandomGlyphs::new())
}

// Quantize each channel into one of 6 levels, giving a 216-entry code
// space starting at CUBE_OFFSET. Code CUBE_OFFSET itself (all channels
// in the lowest level) is the near-black sentinel.
fn cube_code(pixel: &Rgba<u8>) -> u16 {
    let r = (pixel[0] as u16 * 6) / 256;
    let g = (pixel[1] as u16 * 6) / 256;
    let b = (pixel[2] as u16 * 6) / 256;
    CUBE_OFFSET + 36 * r + 6 * g + b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_cube_code_levels() {
        assert_eq!(cube_code(&Rgba([0, 0, 0, 255])), 16);
        assert_eq!(cube_code(&Rgba([255, 255, 255, 255])), 16 + 36 * 5 + 6 * 5 + 5);
        assert_eq!(cube_code(&Rgba([255, 0, 0, 255])), 16 + 36 * 5);
        // Channel levels are c * 6 / 256: 42 is still level 0, 43 is level 1.
        assert_eq!(cube_code(&Rgba([42, 0, 0, 255])), 16);
        assert_eq!(cube_code(&Rgba([43, 0, 0, 255])), 16 + 36);
    }

    #[test]
    fn test_single_escape_for_solid_color() {
        // A solid image needs exactly one color escape up front; every
        // following pixel has the same code.
        let img = solid(12, 24, [255, 0, 0, 255]);
        let out = render(&img, 10, &mut SequentialGlyphs::new());

        assert_eq!(count_occurrences(&out, "\x1b[38;5;"), 1);
        assert!(out.starts_with(&format!("\x1b[38;5;{}m", 16 + 36 * 5)));
    }

    #[test]
    fn test_escape_emitted_only_on_color_change() {
        // Two-column image, red then blue: each row flips the color
        // twice at most, never once per pixel.
        let mut img = RgbaImage::new(2, 8);
        for y in 0..8 {
            img.put_pixel(0, y, Rgba([255, 0, 0, 255]));
            img.put_pixel(1, y, Rgba([0, 0, 255, 255]));
        }
        let out = render(&img, 2, &mut SequentialGlyphs::new());

        let rows = out.matches('\n').count();
        let escapes = count_occurrences(&out, "\x1b[38;5;");
        assert!(rows >= 1);
        // Alternating colors: one escape per color run, two runs per row.
        assert_eq!(escapes, rows * 2);
    }

    #[test]
    fn test_rows_end_with_newline_and_output_with_reset() {
        let img = solid(20, 20, [0, 255, 0, 255]);
        let out = render(&img, 10, &mut SequentialGlyphs::new());

        assert!(out.ends_with(RESET));
        let body = &out[..out.len() - RESET.len()];
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_row_count_follows_cell_aspect() {
        // Square image at 100 columns: rows = 100 * 1.0 * 0.46 = 46.
        let img = solid(50, 50, [0, 255, 0, 255]);
        let out = render(&img, 100, &mut SequentialGlyphs::new());
        assert_eq!(out.matches('\n').count(), 46);
    }

    #[test]
    fn test_near_black_renders_blank() {
        let img = solid(10, 10, [10, 10, 10, 255]);
        let out = render(&img, 10, &mut SequentialGlyphs::new());

        // The sentinel maps to a reset, not a foreground color.
        assert_eq!(count_occurrences(&out, "\x1b[38;5;"), 0);
        assert!(out.contains(' '));
        for ch in out.chars() {
            assert!(
                ch == ' ' || ch == '\n' || ch == '\x1b' || ch == '[' || ch == '0' || ch == 'm',
                "unexpected glyph {ch:?} in near-black output"
            );
        }
    }

    #[test]
    fn test_deterministic_with_sequential_glyphs() {
        let img = solid(16, 16, [200, 120, 40, 255]);
        let a = render(&img, 8, &mut SequentialGlyphs::new());
        let b = render(&img, 8, &mut SequentialGlyphs::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_image_is_just_reset() {
        let img = RgbaImage::new(0, 0);
        assert_eq!(render(&img, 80, &mut SequentialGlyphs::new()), RESET);
    }
}
