// ABOUTME: Linux framebuffer access for termpix image display
// ABOUTME: Queries device geometry via ioctl and blits RGBA pixels as BGR(A) bytes

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;

/// Default framebuffer device path.
pub const DEFAULT_DEVICE: &str = "/dev/fb0";

/// Framebuffer geometry as reported by the device.
///
/// `stride` is the number of bytes per scanline, which may exceed
/// `width * bpp` on devices with scanline padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbGeometry {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub bpp: usize,
}

impl FbGeometry {
    /// Device-independent defaults used when the geometry query fails.
    ///
    /// Output produced with these values is very likely spatially wrong
    /// unless the real device happens to match them.
    pub fn fallback() -> Self {
        Self {
            width: 1920,
            height: 1080,
            stride: 1920 * 4,
            bpp: 4,
        }
    }

    /// Size in bytes of the draw buffer for this geometry.
    pub fn buffer_len(&self) -> usize {
        self.width * self.height * self.bpp
    }
}

/// Query the framebuffer device for its geometry.
///
/// Returns width and height in pixels, the stride in bytes, and the
/// bytes per pixel. The result is never cached; the device may be
/// reconfigured between calls.
#[cfg(target_os = "linux")]
pub fn probe_geometry(device: &Path) -> Result<FbGeometry> {
    use std::os::fd::AsRawFd;

    let file = std::fs::File::open(device)
        .with_context(|| format!("failed to open framebuffer device {}", device.display()))?;
    let fd = file.as_raw_fd();

    let mut var = ioctl::FbVarScreeninfo::default();
    // SAFETY: fd is a valid open descriptor and the struct matches the
    // kernel's fb_var_screeninfo layout.
    let rc = unsafe { libc::ioctl(fd, ioctl::FBIOGET_VSCREENINFO as _, &mut var) };
    if rc == -1 {
        return Err(anyhow!(
            "FBIOGET_VSCREENINFO failed on {}: {}",
            device.display(),
            std::io::Error::last_os_error()
        ));
    }

    let mut fix = ioctl::FbFixScreeninfo::default();
    // SAFETY: as above, for fb_fix_screeninfo.
    let rc = unsafe { libc::ioctl(fd, ioctl::FBIOGET_FSCREENINFO as _, &mut fix) };
    if rc == -1 {
        return Err(anyhow!(
            "FBIOGET_FSCREENINFO failed on {}: {}",
            device.display(),
            std::io::Error::last_os_error()
        ));
    }

    if var.bits_per_pixel % 8 != 0 || var.bits_per_pixel == 0 {
        return Err(anyhow!(
            "unsupported framebuffer depth: {} bits per pixel",
            var.bits_per_pixel
        ));
    }

    Ok(FbGeometry {
        width: var.xres as usize,
        height: var.yres as usize,
        stride: fix.line_length as usize,
        bpp: (var.bits_per_pixel / 8) as usize,
    })
}

#[cfg(not(target_os = "linux"))]
pub fn probe_geometry(device: &Path) -> Result<FbGeometry> {
    Err(anyhow!(
        "no framebuffer support on this platform (device {})",
        device.display()
    ))
}

/// Write an image's pixels into `buf` at the given position.
///
/// Offsets are computed from the device stride; any write that would land
/// past the end of `buf` is skipped. The device pixel order is BGR, with
/// an alpha byte appended when `bpp >= 4`.
pub fn draw_on_buf(
    buf: &mut [u8],
    img: &RgbaImage,
    pos_x: u32,
    pos_y: u32,
    stride: usize,
    bpp: usize,
) {
    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = bpp * ((pos_y + y) as usize * stride + (pos_x + x) as usize);
        write_pixel(buf, offset, bpp, pixel.0);
    }
}

/// Like [`draw_on_buf`], but scales the image by `scale` while drawing.
///
/// The source pixel for destination `(x, y)` is `(x / scale, y / scale)`,
/// truncated toward zero.
pub fn draw_scaled_on_buf(
    buf: &mut [u8],
    img: &RgbaImage,
    pos_x: u32,
    pos_y: u32,
    scale: f64,
    stride: usize,
    bpp: usize,
) {
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 {
        return;
    }

    let scaled_w = (img_w as f64 * scale) as u32;
    let scaled_h = (img_h as f64 * scale) as u32;

    for y in 0..scaled_h {
        for x in 0..scaled_w {
            let src_x = ((x as f64 / scale) as u32).min(img_w - 1);
            let src_y = ((y as f64 / scale) as u32).min(img_h - 1);
            let pixel = img.get_pixel(src_x, src_y);
            let offset = bpp * ((pos_y + y) as usize * stride + (pos_x + x) as usize);
            write_pixel(buf, offset, bpp, pixel.0);
        }
    }
}

// Source channels are RGBA; the device wants B, G, R, then A when bpp
// allows it. Writes never exceed offset + bpp.
fn write_pixel(buf: &mut [u8], offset: usize, bpp: usize, rgba: [u8; 4]) {
    if offset + bpp > buf.len() {
        return;
    }
    let bgra = [rgba[2], rgba[1], rgba[0], rgba[3]];
    let n = bpp.min(bgra.len());
    buf[offset..offset + n].copy_from_slice(&bgra[..n]);
}

/// Draw an image on the framebuffer device at the given position.
///
/// The whole frame is recomputed and replaces prior device content; any
/// pixel not covered by the image becomes black. A failed geometry query
/// is degraded to [`FbGeometry::fallback`] rather than aborting.
pub fn draw_image_at(img: &RgbaImage, pos_x: u32, pos_y: u32, device: &Path) -> Result<()> {
    let geometry = probe_or_fallback(device);
    draw_with_geometry(img, pos_x, pos_y, None, geometry, device)
}

/// Draw an image scaled by `scale` on the framebuffer device.
pub fn draw_scaled_image_at(
    img: &RgbaImage,
    pos_x: u32,
    pos_y: u32,
    scale: f64,
    device: &Path,
) -> Result<()> {
    let geometry = probe_or_fallback(device);
    draw_with_geometry(img, pos_x, pos_y, Some(scale), geometry, device)
}

/// Draw with an explicit geometry instead of probing the device.
///
/// `scale` selects the scaled-blit variant; `None` copies pixels 1:1.
pub fn draw_with_geometry(
    img: &RgbaImage,
    pos_x: u32,
    pos_y: u32,
    scale: Option<f64>,
    geometry: FbGeometry,
    device: &Path,
) -> Result<()> {
    let mut buf = vec![0u8; geometry.buffer_len()];
    match scale {
        Some(factor) => draw_scaled_on_buf(
            &mut buf,
            img,
            pos_x,
            pos_y,
            factor,
            geometry.stride,
            geometry.bpp,
        ),
        None => draw_on_buf(&mut buf, img, pos_x, pos_y, geometry.stride, geometry.bpp),
    }
    write_device(device, &buf)
}

fn probe_or_fallback(device: &Path) -> FbGeometry {
    match probe_geometry(device) {
        Ok(geometry) => geometry,
        Err(e) => {
            log::warn!(
                "framebuffer geometry query failed ({e:#}); using fallback geometry, output may be misplaced"
            );
            FbGeometry::fallback()
        }
    }
}

// One whole-buffer write replacing the entire frame.
fn write_device(device: &Path, buf: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(device)
        .with_context(|| format!("failed to open {} for writing", device.display()))?;
    file.write_all(buf)
        .with_context(|| format!("error writing to framebuffer {}", device.display()))?;
    Ok(())
}

#[cfg(target_os = "linux")]
mod ioctl {
    //! Minimal fb_var_screeninfo / fb_fix_screeninfo bindings from
    //! <linux/fb.h>, limited to the fields the geometry probe reads.

    pub const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
    pub const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

    #[repr(C)]
    #[derive(Default, Clone, Copy)]
    pub struct FbBitfield {
        pub offset: u32,
        pub length: u32,
        pub msb_right: u32,
    }

    #[repr(C)]
    #[derive(Default, Clone, Copy)]
    pub struct FbVarScreeninfo {
        pub xres: u32,
        pub yres: u32,
        pub xres_virtual: u32,
        pub yres_virtual: u32,
        pub xoffset: u32,
        pub yoffset: u32,
        pub bits_per_pixel: u32,
        pub grayscale: u32,
        pub red: FbBitfield,
        pub green: FbBitfield,
        pub blue: FbBitfield,
        pub transp: FbBitfield,
        pub nonstd: u32,
        pub activate: u32,
        pub height: u32,
        pub width: u32,
        pub accel_flags: u32,
        pub pixclock: u32,
        pub left_margin: u32,
        pub right_margin: u32,
        pub upper_margin: u32,
        pub lower_margin: u32,
        pub hsync_len: u32,
        pub vsync_len: u32,
        pub sync: u32,
        pub vmode: u32,
        pub rotate: u32,
        pub colorspace: u32,
        pub reserved: [u32; 4],
    }

    #[repr(C)]
    #[derive(Clone, Copy)]
    pub struct FbFixScreeninfo {
        pub id: [u8; 16],
        pub smem_start: libc::c_ulong,
        pub smem_len: u32,
        pub fb_type: u32,
        pub type_aux: u32,
        pub visual: u32,
        pub xpanstep: u16,
        pub ypanstep: u16,
        pub ywrapstep: u16,
        pub line_length: u32,
        pub mmio_start: libc::c_ulong,
        pub mmio_len: u32,
        pub accel: u32,
        pub capabilities: u16,
        pub reserved: [u16; 2],
    }

    impl Default for FbFixScreeninfo {
        fn default() -> Self {
            // SAFETY: all fields are plain integers; zeroed is a valid value.
            unsafe { std::mem::zeroed() }
        }
    }
}
