// ABOUTME: Color palette reduction for indexed-color terminal protocols
// ABOUTME: Median-cut palette generation plus Stucki error-diffusion dithering

use image::RgbaImage;

/// Hard limit on palette size, matching what indexed-color terminal
/// protocols can address.
pub const MAX_PALETTE: usize = 256;

/// A single palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    fn channel(&self, index: usize) -> u8 {
        match index {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }
}

/// An image whose pixels store palette indices instead of raw channels.
#[derive(Debug, Clone)]
pub struct PalettedImage {
    pub width: u32,
    pub height: u32,
    pub palette: Vec<Rgb>,
    pub indices: Vec<u8>,
}

/// Reduce a true-color image to at most [`MAX_PALETTE`] colors.
///
/// The palette is built with median-cut over the image's color
/// distribution; pixels are then mapped to palette indices with a Stucki
/// error-diffusion pass. Both stages are deterministic: identical input
/// pixels always produce identical output.
pub fn quantize(img: &RgbaImage) -> PalettedImage {
    let (width, height) = img.dimensions();
    let pixels: Vec<Rgb> = img
        .pixels()
        .map(|p| Rgb {
            r: p[0],
            g: p[1],
            b: p[2],
        })
        .collect();

    let palette = median_cut(&pixels, MAX_PALETTE);
    let indices = dither_stucki(&pixels, width, height, &palette);

    PalettedImage {
        width,
        height,
        palette,
        indices,
    }
}

// A box holds a slice of the image's unique colors, each weighted by its
// pixel count.
#[derive(Debug, Clone, Copy)]
struct WeightedColor {
    color: Rgb,
    count: u32,
}

/// Build a palette of up to `max_colors` entries with median-cut.
///
/// The color space is split recursively along the channel with the
/// widest range, at the population median. Splitting stops when every
/// box holds a single color or the budget is reached.
fn median_cut(pixels: &[Rgb], max_colors: usize) -> Vec<Rgb> {
    if pixels.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    // Collapse to unique colors with counts; sorted order keeps the
    // whole computation independent of pixel order.
    let mut sorted: Vec<Rgb> = pixels.to_vec();
    sorted.sort_by_key(|c| (c.r, c.g, c.b));
    let mut colors: Vec<WeightedColor> = Vec::new();
    for color in sorted {
        match colors.last_mut() {
            Some(last) if last.color == color => last.count += 1,
            _ => colors.push(WeightedColor { color, count: 1 }),
        }
    }

    let mut boxes: Vec<Vec<WeightedColor>> = vec![colors];
    while boxes.len() < max_colors {
        let Some((index, channel)) = widest_splittable_box(&boxes) else {
            break;
        };

        let mut cell = boxes.swap_remove(index);
        cell.sort_by_key(|w| {
            (
                w.color.channel(channel),
                w.color.r,
                w.color.g,
                w.color.b,
            )
        });

        let upper = cell.split_off(split_point(&cell));
        boxes.push(cell);
        boxes.push(upper);
    }

    let mut palette: Vec<Rgb> = boxes.iter().map(|b| box_average(b)).collect();
    palette.sort_by_key(|c| (c.r, c.g, c.b));
    palette.dedup();
    palette
}

// Pick the box with the widest channel range; ties resolve to the lowest
// box index and the lowest channel, keeping the cut order deterministic.
fn widest_splittable_box(boxes: &[Vec<WeightedColor>]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, u8)> = None;
    for (index, cell) in boxes.iter().enumerate() {
        if cell.len() < 2 {
            continue;
        }
        for channel in 0..3 {
            let mut min = u8::MAX;
            let mut max = u8::MIN;
            for w in cell {
                let v = w.color.channel(channel);
                min = min.min(v);
                max = max.max(v);
            }
            let range = max - min;
            if best.map_or(range > 0, |(_, _, r)| range > r) {
                best = Some((index, channel, range));
            }
        }
    }
    best.map(|(index, channel, _)| (index, channel))
}

// Split at the population median: the first index where the cumulative
// count reaches half, clamped so both halves stay non-empty.
fn split_point(cell: &[WeightedColor]) -> usize {
    let total: u64 = cell.iter().map(|w| w.count as u64).sum();
    let mut cumulative = 0u64;
    for (i, w) in cell.iter().enumerate() {
        cumulative += w.count as u64;
        if cumulative * 2 >= total {
            return (i + 1).min(cell.len() - 1).max(1);
        }
    }
    cell.len() - 1
}

fn box_average(cell: &[WeightedColor]) -> Rgb {
    let mut sum = [0u64; 3];
    let mut total = 0u64;
    for w in cell {
        sum[0] += w.color.r as u64 * w.count as u64;
        sum[1] += w.color.g as u64 * w.count as u64;
        sum[2] += w.color.b as u64 * w.count as u64;
        total += w.count as u64;
    }
    if total == 0 {
        return Rgb { r: 0, g: 0, b: 0 };
    }
    Rgb {
        r: (sum[0] / total) as u8,
        g: (sum[1] / total) as u8,
        b: (sum[2] / total) as u8,
    }
}

// Stucki diffusion weights over the two rows below the current pixel:
//
//           *   8   4
//   2   4   8   4   2
//   1   2   4   2   1     (divided by 42)
const STUCKI_KERNEL: [(i32, i32, f32); 12] = [
    (1, 0, 8.0 / 42.0),
    (2, 0, 4.0 / 42.0),
    (-2, 1, 2.0 / 42.0),
    (-1, 1, 4.0 / 42.0),
    (0, 1, 8.0 / 42.0),
    (1, 1, 4.0 / 42.0),
    (2, 1, 2.0 / 42.0),
    (-2, 2, 1.0 / 42.0),
    (-1, 2, 2.0 / 42.0),
    (0, 2, 4.0 / 42.0),
    (1, 2, 2.0 / 42.0),
    (2, 2, 1.0 / 42.0),
];

/// Map every pixel to its nearest palette entry, diffusing the
/// quantization error to not-yet-processed neighbors.
fn dither_stucki(pixels: &[Rgb], width: u32, height: u32, palette: &[Rgb]) -> Vec<u8> {
    if palette.is_empty() {
        return vec![0; pixels.len()];
    }

    let w = width as i32;
    let h = height as i32;
    let mut error = vec![[0f32; 3]; pixels.len()];
    let mut indices = vec![0u8; pixels.len()];

    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let p = pixels[i];
            let want = [
                (p.r as f32 + error[i][0]).clamp(0.0, 255.0),
                (p.g as f32 + error[i][1]).clamp(0.0, 255.0),
                (p.b as f32 + error[i][2]).clamp(0.0, 255.0),
            ];

            let index = nearest_color(palette, want);
            indices[i] = index as u8;

            let chosen = palette[index];
            let residual = [
                want[0] - chosen.r as f32,
                want[1] - chosen.g as f32,
                want[2] - chosen.b as f32,
            ];

            for (dx, dy, weight) in STUCKI_KERNEL {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || nx >= w || ny >= h {
                    continue;
                }
                let n = (ny * w + nx) as usize;
                error[n][0] += residual[0] * weight;
                error[n][1] += residual[1] * weight;
                error[n][2] += residual[2] * weight;
            }
        }
    }

    indices
}

// Nearest palette entry by squared Euclidean RGB distance; ties resolve
// to the lowest index.
fn nearest_color(palette: &[Rgb], want: [f32; 3]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, c) in palette.iter().enumerate() {
        let dr = want[0] - c.r as f32;
        let dg = want[1] - c.g as f32;
        let db = want[2] - c.b as f32;
        let dist = dr * dr + dg * dg + db * db;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) * 127 / (width + height).max(1)) as u8,
                255,
            ])
        })
    }

    #[test]
    fn test_palette_bounded_and_indices_in_range() {
        let img = gradient_image(64, 64);
        let paletted = quantize(&img);

        assert!(paletted.palette.len() <= MAX_PALETTE);
        assert!(!paletted.palette.is_empty());
        assert_eq!(paletted.indices.len(), 64 * 64);
        let len = paletted.palette.len() as u8;
        assert!(paletted.indices.iter().all(|&i| i < len));
    }

    #[test]
    fn test_palette_entries_are_distinct() {
        let img = gradient_image(32, 32);
        let paletted = quantize(&img);
        let mut seen = paletted.palette.clone();
        seen.sort_by_key(|c| (c.r, c.g, c.b));
        seen.dedup();
        assert_eq!(seen.len(), paletted.palette.len());
    }

    #[test]
    fn test_two_color_image_maps_exactly() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let paletted = quantize(&img);
        assert_eq!(paletted.palette.len(), 2);

        let first = paletted.palette[paletted.indices[0] as usize];
        let second = paletted.palette[paletted.indices[1] as usize];
        assert_eq!(first, Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(second, Rgb { r: 0, g: 0, b: 255 });
    }

    #[test]
    fn test_solid_image_collapses_to_one_entry() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 200, 30, 255]));
        let paletted = quantize(&img);
        assert_eq!(
            paletted.palette,
            vec![Rgb {
                r: 10,
                g: 200,
                b: 30
            }]
        );
        assert!(paletted.indices.iter().all(|&i| i == 0));
    }

    #[test]
    fn test_quantization_is_deterministic() {
        let img = gradient_image(48, 32);
        let a = quantize(&img);
        let b = quantize(&img);
        assert_eq!(a.palette, b.palette);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn test_empty_image() {
        let img = RgbaImage::new(0, 0);
        let paletted = quantize(&img);
        assert!(paletted.palette.is_empty());
        assert!(paletted.indices.is_empty());
    }

    #[test]
    fn test_median_cut_splits_widest_channel() {
        // Colors spread only along green: the palette should separate
        // the low and high clusters.
        let pixels = vec![
            Rgb { r: 10, g: 0, b: 10 },
            Rgb { r: 10, g: 5, b: 10 },
            Rgb {
                r: 10,
                g: 250,
                b: 10,
            },
            Rgb {
                r: 10,
                g: 255,
                b: 10,
            },
        ];
        let palette = median_cut(&pixels, 2);
        assert_eq!(palette.len(), 2);
        assert!(palette[0].g < 128 && palette[1].g > 128);
    }
}
