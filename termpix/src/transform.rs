// ABOUTME: Geometric image transforms: resize, scale, and bounds-fitting
// ABOUTME: Nearest-neighbor resampling with integer source mapping

use image::RgbaImage;

/// Resize an image to the given dimensions with nearest-neighbor sampling.
///
/// When both `width` and `height` are 0 the input is returned unchanged.
/// When exactly one is 0 it is derived from the other, preserving the
/// original aspect ratio (truncated toward zero). When both are given
/// they are used verbatim; the caller is responsible for aspect-correct
/// values.
///
/// The source pixel for destination `(x, y)` is `(x * src_w / dst_w,
/// y * src_h / dst_h)` with integer division. This mapping has a slight
/// sampling bias versus a centered one and is kept for output
/// compatibility.
pub fn resize(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if width == 0 && height == 0 {
        return img.clone();
    }

    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return RgbaImage::new(width, height);
    }

    let mut width = width;
    let mut height = height;

    if width == 0 {
        width = (src_w as f64 * (height as f64 / src_h as f64)) as u32;
    } else if height == 0 {
        height = (src_h as f64 * (width as f64 / src_w as f64)) as u32;
    }

    let mut resized = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let src_x = (x as u64 * src_w as u64 / width as u64) as u32;
            let src_y = (y as u64 * src_h as u64 / height as u64) as u32;
            resized.put_pixel(x, y, *img.get_pixel(src_x, src_y));
        }
    }

    resized
}

/// Scale an image by `factor` with nearest-neighbor sampling.
///
/// A factor of exactly 1.0 returns the input unchanged. New dimensions
/// are `dimension * factor` truncated toward zero; the source pixel for
/// destination `(x, y)` is `(x / factor, y / factor)`, also truncated.
pub fn scale(img: &RgbaImage, factor: f64) -> RgbaImage {
    if factor == 1.0 {
        return img.clone();
    }

    let (src_w, src_h) = img.dimensions();
    let scaled_w = (src_w as f64 * factor) as u32;
    let scaled_h = (src_h as f64 * factor) as u32;

    let mut scaled = RgbaImage::new(scaled_w, scaled_h);
    for y in 0..scaled_h {
        for x in 0..scaled_w {
            let src_x = ((x as f64 / factor) as u32).min(src_w.saturating_sub(1));
            let src_y = ((y as f64 / factor) as u32).min(src_h.saturating_sub(1));
            scaled.put_pixel(x, y, *img.get_pixel(src_x, src_y));
        }
    }

    scaled
}

/// Shrink an image so it fits within `max_w` x `max_h`, preserving the
/// aspect ratio. Images already within bounds are returned unchanged.
///
/// The shrink is a two-pass computation: width is clamped first with
/// height following proportionally, and if the result is still too tall,
/// height is clamped with width recomputed from the height ratio. When
/// both dimensions overflow by different ratios this gives a subtly
/// different (and intended) result than a single min-ratio fit.
pub fn fit_to_bounds(img: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (img_w, img_h) = img.dimensions();

    if img_w <= max_w && img_h <= max_h {
        return img.clone();
    }

    let mut new_w = img_w;
    let mut new_h = img_h;

    if img_w > max_w {
        new_w = max_w;
        new_h = (img_h as f64 * (max_w as f64 / img_w as f64)) as u32;
    }

    if new_h > max_h {
        new_h = max_h;
        new_w = (img_w as f64 * (max_h as f64 / img_h as f64)) as u32;
    }

    resize(img, new_w, new_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn solid(width: u32, height: u32, pixel: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, pixel)
    }

    #[test]
    fn test_resize_zero_zero_is_identity() {
        let img = solid(4, 4, RED);
        let out = resize(&img, 0, 0);
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_resize_derives_height_from_width() {
        // 4x4 red image, width 8 requested: height follows the aspect
        // ratio and every pixel stays fully red opaque.
        let img = solid(4, 4, RED);
        let out = resize(&img, 8, 0);
        assert_eq!(out.dimensions(), (8, 8));
        assert!(out.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_resize_derives_width_from_height() {
        let img = solid(200, 100, RED);
        let out = resize(&img, 0, 50);
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_derived_dimension_truncates() {
        // 3:1 aspect, width 100: height = 100 * 100 / 300 = 33.33 -> 33.
        let img = solid(300, 100, RED);
        let out = resize(&img, 100, 0);
        assert_eq!(out.dimensions(), (100, 33));
    }

    #[test]
    fn test_resize_both_dimensions_verbatim() {
        // Aspect ratio is ignored when both dimensions are given.
        let img = solid(10, 10, RED);
        let out = resize(&img, 7, 3);
        assert_eq!(out.dimensions(), (7, 3));
    }

    #[test]
    fn test_resize_nearest_neighbor_mapping() {
        // 2x1 image (red, blue) doubled: source pixel is x * 2 / 4, so
        // destination columns 0,1 are red and 2,3 are blue.
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, RED);
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let out = resize(&img, 4, 1);
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 0), RED);
        assert_eq!(*out.get_pixel(2, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.get_pixel(3, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_scale_identity() {
        let img = solid(5, 3, RED);
        let out = scale(&img, 1.0);
        assert_eq!(out.dimensions(), (5, 3));
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_scale_up() {
        let img = solid(2, 2, RED);
        let out = scale(&img, 2.0);
        assert_eq!(out.dimensions(), (4, 4));
        assert!(out.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_scale_down_truncates_dimensions() {
        // 5 * 0.5 = 2.5 truncates to 2.
        let img = solid(5, 5, RED);
        let out = scale(&img, 0.5);
        assert_eq!(out.dimensions(), (2, 2));
    }

    #[test]
    fn test_fit_within_bounds_is_noop() {
        let img = solid(80, 24, RED);
        let out = fit_to_bounds(&img, 80, 24);
        assert_eq!(out.dimensions(), (80, 24));
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_fit_shrinks_only_overflowing_width() {
        let img = solid(160, 20, RED);
        let out = fit_to_bounds(&img, 80, 24);
        // Width clamps to 80, height follows: 20 * 80/160 = 10.
        assert_eq!(out.dimensions(), (80, 10));
    }

    #[test]
    fn test_fit_shrinks_only_overflowing_height() {
        let img = solid(40, 48, RED);
        let out = fit_to_bounds(&img, 80, 24);
        // Height clamps to 24, width follows: 40 * 24/48 = 20.
        assert_eq!(out.dimensions(), (20, 24));
    }

    #[test]
    fn test_fit_two_pass_shrink_when_both_overflow() {
        // 200x100 into (80, 24): width pass gives 80x40, height still
        // overflows so the second pass gives 24 rows and width
        // 200 * 24/100 = 48.
        let img = solid(200, 100, RED);
        let out = fit_to_bounds(&img, 80, 24);
        assert_eq!(out.dimensions(), (48, 24));
    }

    #[test]
    fn test_fit_is_idempotent_after_one_application() {
        let img = solid(200, 100, RED);
        let fitted = fit_to_bounds(&img, 80, 24);
        let again = fit_to_bounds(&fitted, 80, 24);
        assert_eq!(again.dimensions(), fitted.dimensions());
        assert_eq!(again.as_raw(), fitted.as_raw());
    }
}
