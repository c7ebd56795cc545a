// ABOUTME: Sixel raster protocol encoder for indexed-color images
// ABOUTME: Emits palette definitions and run-length encoded six-row bands

use crate::quantize::PalettedImage;

/// Encode a paletted image as a Sixel escape sequence.
///
/// The output defines every palette entry in RGB percent, then walks the
/// image in six-row bands. Within a band each used color is drawn as one
/// pass over the columns with `!`-prefixed run-length compression, `$`
/// rewinding to the band start between colors and `-` advancing bands.
pub fn encode(img: &PalettedImage) -> String {
    let width = img.width as usize;
    let height = img.height as usize;

    let mut out = String::new();

    // DCS introducer and raster attributes: 1:1 pixel aspect plus the
    // pixel dimensions so conforming terminals can size the image early.
    out.push_str("\x1bPq");
    out.push_str(&format!("\"1;1;{};{}", width, height));

    // Palette entries are registered in RGB percent (0-100).
    for (i, c) in img.palette.iter().enumerate() {
        let r = c.r as u32 * 100 / 255;
        let g = c.g as u32 * 100 / 255;
        let b = c.b as u32 * 100 / 255;
        out.push_str(&format!("#{};2;{};{};{}", i, r, g, b));
    }

    if width > 0 {
        for band_start in (0..height).step_by(6) {
            let band_rows = (height - band_start).min(6);

            let mut colors_used = [false; 256];
            for y in band_start..band_start + band_rows {
                for x in 0..width {
                    colors_used[img.indices[y * width + x] as usize] = true;
                }
            }

            for color in 0..img.palette.len() {
                if !colors_used[color] {
                    continue;
                }

                out.push_str(&format!("#{}", color));

                let mut x = 0;
                while x < width {
                    let bits = band_bits(img, band_start, band_rows, x, color);

                    let mut run = 1;
                    while x + run < width
                        && band_bits(img, band_start, band_rows, x + run, color) == bits
                    {
                        run += 1;
                    }

                    let ch = (63 + bits) as char;
                    if run > 3 {
                        out.push_str(&format!("!{}{}", run, ch));
                    } else {
                        for _ in 0..run {
                            out.push(ch);
                        }
                    }
                    x += run;
                }

                // Rewind to the band start so the next color overlays it.
                out.push('$');
            }

            out.push('-');
        }
    }

    // String terminator
    out.push_str("\x1b\\");
    out
}

// One column's six-bit pattern for a color within a band; bit N is row
// band_start + N.
fn band_bits(img: &PalettedImage, band_start: usize, band_rows: usize, x: usize, color: usize) -> u8 {
    let width = img.width as usize;
    let mut bits = 0u8;
    for row in 0..band_rows {
        let y = band_start + row;
        if img.indices[y * width + x] as usize == color {
            bits |= 1 << row;
        }
    }
    bits
}
