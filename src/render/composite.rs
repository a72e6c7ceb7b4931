//! Source-over compositing of tile bitmaps onto the result canvas.

use image::{Rgba, RgbaImage};

use super::engine::PixelRect;

/// Uniform mask alpha for a layer opacity; `None` at full opacity.
pub fn opacity_mask(opacity: f32) -> Option<u8> {
    if opacity < 1.0 {
        Some((opacity.max(0.0) * 255.0) as u8)
    } else {
        None
    }
}

/// Draw `src` into `dest` on `canvas` with "over" compositing.
///
/// The drawn area is `src` aligned to the top-left of `dest`, clipped to
/// both `dest` and the canvas. With a mask every source alpha is scaled by
/// `mask / 255` before blending.
pub fn draw_over(canvas: &mut RgbaImage, src: &RgbaImage, dest: PixelRect, mask: Option<u8>) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let w = dest.width.min(src.width()) as i64;
    let h = dest.height.min(src.height()) as i64;

    let x0 = dest.x.max(0);
    let y0 = dest.y.max(0);
    let x1 = (dest.x + w).min(cw);
    let y1 = (dest.y + h).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let coverage = mask.unwrap_or(u8::MAX);
    for cy in y0..y1 {
        for cx in x0..x1 {
            let s = *src.get_pixel((cx - dest.x) as u32, (cy - dest.y) as u32);
            let d = canvas.get_pixel_mut(cx as u32, cy as u32);
            blend_over(d, s, coverage);
        }
    }
}

/// Porter-Duff "over" on non-premultiplied RGBA8.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: u8) {
    let sa = src[3] as f32 / 255.0 * (coverage as f32 / 255.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
