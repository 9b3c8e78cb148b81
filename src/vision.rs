// Pixel-level helpers shared by the fog paint, the eraser and the export.
// Visual: blur makes the glass look frosted, cover-fit keeps the photo
// undistorted, and `erase` is the "finger on the glass" (destination-out).
use crate::types::{Coverage, Stamp};
use image::{RgbImage, RgbaImage};
use tiny_skia::{FilterQuality, IntSize, Mask, Pixmap, PixmapPaint, PixmapRef, Transform};

/* ---------------------------------- blur ---------------------------------- */

/// Box blur one line of `len` elements, `stride` bytes apart, `channels` interleaved.
/// Edges are extended so borders don't darken.
fn blur_line(src: &[u8], dst: &mut [u8], start: usize, len: usize, stride: usize, channels: usize, r: usize) {
    let at = |i: usize, c: usize| src[start + i.min(len - 1) * stride + c] as u32;
    let win = (2 * r + 1) as u32; // window width for averaging (constant everywhere)

    // Prime the window [-r..r] with the edge value repeated on the left
    let mut sum = [0u32; 4];
    for (c, s) in sum.iter_mut().enumerate().take(channels) {
        *s = at(0, c) * (r as u32 + 1);
        for i in 1..=r {
            *s += at(i, c);
        }
    }

    // Slide the window along the line (add right, remove left)
    for i in 0..len {
        for (c, s) in sum.iter_mut().enumerate().take(channels) {
            dst[start + i * stride + c] = ((*s + win / 2) / win) as u8;
            let left = i.saturating_sub(r);
            let right = i + r + 1;
            *s = *s + at(right, c) - at(left, c);
        }
    }
}

/// One separable box blur pass (horizontal then vertical) over an interleaved buffer.
pub fn box_blur(buf: &mut [u8], width: usize, height: usize, channels: usize, radius: usize) {
    if radius == 0 || width == 0 || height == 0 || channels == 0 || channels > 4 {
        return;
    }
    debug_assert_eq!(buf.len(), width * height * channels);
    let mut tmp = vec![0u8; buf.len()];

    /* ---- Pass 1: Horizontal (store averaged rows in tmp) ---- */
    for y in 0..height {
        blur_line(buf, &mut tmp, y * width * channels, width, channels, channels, radius);
    }

    /* ---- Pass 2: Vertical (read tmp, write back) ---- */
    for x in 0..width {
        blur_line(&tmp, buf, x * channels, height, width * channels, channels, radius);
    }
}

/// Box radius whose 3-pass repetition approximates a gaussian of `sigma`.
pub fn box_radius_for_sigma(sigma: f32) -> usize {
    let w = (4.0 * sigma * sigma + 1.0).sqrt(); // ideal box width for 3 passes
    (((w - 1.0) / 2.0).round() as usize).max(1)
}

/// Approximate gaussian blur: three box passes.
/// Works on premultiplied RGBA as well as single-channel masks.
pub fn gaussian_blur(buf: &mut [u8], width: usize, height: usize, channels: usize, sigma: f32) {
    if sigma <= 0.0 {
        return;
    }
    let r = box_radius_for_sigma(sigma);
    for _ in 0..3 {
        box_blur(buf, width, height, channels, r);
    }
}

/// Blur a whole pixmap in place.
pub fn blur_pixmap(pixmap: &mut Pixmap, sigma: f32) {
    let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
    gaussian_blur(pixmap.data_mut(), w, h, 4, sigma);
}

/* -------------------------------- cover fit -------------------------------- */

/// Uniform scale + centring offset that makes an image cover a target rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub scale: f32,
    pub dx: f32,
    pub dy: f32,
}

impl CoverFit {
    pub fn new(src_w: f32, src_h: f32, dst_w: f32, dst_h: f32) -> Self {
        let scale = (dst_w / src_w).max(dst_h / src_h);
        Self {
            scale,
            dx: (dst_w - src_w * scale) / 2.0,
            dy: (dst_h - src_h * scale) / 2.0,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_row(self.scale, 0.0, 0.0, self.scale, self.dx, self.dy)
    }
}

/// Draw `image` scaled to cover the whole of `target`, cropping the overflow.
pub fn draw_cover(target: &mut Pixmap, image: PixmapRef<'_>, clip: Option<&Mask>) {
    let fit = CoverFit::new(
        image.width() as f32,
        image.height() as f32,
        target.width() as f32,
        target.height() as f32,
    );
    let paint = PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
    target.draw_pixmap(0, 0, image, &paint, fit.transform(), clip);
}

/* ---------------------------- destination-out ---------------------------- */

/// Wipe fog: every covered pixel keeps `(1 - coverage * clip)` of its colour and alpha.
/// Pixels outside the surface are skipped; the clip (if any) confines the wipe.
pub fn erase(pixmap: &mut Pixmap, coverage: &Coverage, clip: Option<&Mask>) {
    let pw = pixmap.width() as i32;
    let ph = pixmap.height() as i32;
    let clip_data = clip.map(|m| m.data());
    let data = pixmap.data_mut();

    for cy in 0..coverage.height {
        let sy = coverage.y + cy as i32;
        if sy < 0 || sy >= ph { continue; }
        for cx in 0..coverage.width {
            let sx = coverage.x + cx as i32;
            if sx < 0 || sx >= pw { continue; }

            let mut a = coverage.alpha[cy * coverage.width + cx];
            if a <= 0.0 { continue; }          // visual: fog untouched
            let idx = sy as usize * pw as usize + sx as usize;
            if let Some(mask) = clip_data {
                a *= mask[idx] as f32 / 255.0;
            }
            let keep = 1.0 - a.min(1.0);

            // Premultiplied: scaling all four channels keeps the colour, fades the fog.
            for v in &mut data[idx * 4..idx * 4 + 4] {
                *v = (*v as f32 * keep).round() as u8;
            }
        }
    }
}

/* --------------------------------- brushes --------------------------------- */

/// Round brush: solid out to `core_radius`, then a gaussian falloff of
/// `feather` pixels (sigma = feather / 2), peak 1.0.
/// Visual: defines how soft the wiped edge looks.
pub fn make_brush_stamp(core_radius: f32, feather: f32) -> Stamp {
    let sigma = (feather * 0.5).max(0.0);
    let radius = (core_radius + 3.0 * sigma).ceil().max(1.0) as i32;
    let d = 2 * radius + 1;                   // kernel size (width = height)
    let s2 = 2.0 * sigma * sigma;             // denominator in the exponent
    let mut weights = Vec::with_capacity((d * d) as usize);

    for y in -radius..=radius {
        for x in -radius..=radius {
            let dist = ((x * x + y * y) as f32).sqrt();
            let w = if dist <= core_radius {
                1.0
            } else if s2 > 0.0 {
                let out = dist - core_radius;
                (-out * out / s2).exp()       // e^{ -r^2 / (2 sigma^2) }
            } else {
                0.0
            };
            weights.push(w);
        }
    }

    Stamp { radius, weights }
}

/// Dab the stamp into the coverage at surface position (cx, cy), keeping the
/// stronger of the old and new value (overlapping dabs don't stack).
pub fn dab_max(coverage: &mut Coverage, cx: i32, cy: i32, stamp: &Stamp) {
    let w = coverage.width as i32;
    let h = coverage.height as i32;
    let r = stamp.radius;
    let d = 2 * r + 1;

    for ky in 0..d {
        for kx in 0..d {
            let lx = cx - coverage.x + kx - r;  // coverage x for this kernel cell
            let ly = cy - coverage.y + ky - r;  // coverage y for this kernel cell
            if lx < 0 || ly < 0 || lx >= w || ly >= h { continue; }
            let idx = ly as usize * coverage.width + lx as usize;
            let kidx = ky as usize * d as usize + kx as usize;
            let a = &mut coverage.alpha[idx];
            *a = a.max(stamp.weights[kidx]);
        }
    }
}

/* ------------------------------- conversions ------------------------------- */

/// Straight-alpha RGBA image -> premultiplied pixmap.
pub fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
}

/// Flatten onto black and drop alpha (JPEG has no alpha channel).
pub fn pixmap_to_rgb(pixmap: &Pixmap) -> Option<RgbImage> {
    let mut out = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for px in pixmap.data().chunks_exact(4) {
        // premultiplied rgb == the colour composited over black
        out.extend_from_slice(&px[..3]);
    }
    RgbImage::from_raw(pixmap.width(), pixmap.height(), out)
}

/// Pack a pixmap as 0x00RRGGBB words (over black) for the window.
pub fn pixmap_to_frame(pixmap: &Pixmap, out: &mut Vec<u32>) {
    out.clear();
    out.extend(pixmap.data().chunks_exact(4).map(|px| {
        ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_keeps_flat_image_flat() {
        let mut buf = vec![77u8; 16 * 9 * 4];
        gaussian_blur(&mut buf, 16, 9, 4, 6.0);
        assert!(buf.iter().all(|&v| v == 77));
    }

    #[test]
    fn test_blur_spreads_a_single_dot() {
        let (w, h) = (21, 21);
        let mut buf = vec![0u8; w * h];
        buf[10 * w + 10] = 255;
        box_blur(&mut buf, w, h, 1, 1);
        // 3x3 window -> 255/9 rounded
        assert_eq!(buf[10 * w + 10], 28);
        assert_eq!(buf[9 * w + 9], 28);
        assert_eq!(buf[8 * w + 10], 0);
    }

    #[test]
    fn test_cover_fit_wide_target() {
        // 100x100 image onto 400x200: width ratio wins
        let fit = CoverFit::new(100.0, 100.0, 400.0, 200.0);
        assert_eq!(fit.scale, 4.0);
        assert_eq!(fit.dx, 0.0);
        assert_eq!(fit.dy, -100.0);
    }

    #[test]
    fn test_cover_fit_tall_target() {
        let fit = CoverFit::new(200.0, 100.0, 100.0, 300.0);
        assert_eq!(fit.scale, 3.0);
        assert_eq!(fit.dx, -250.0);
        assert_eq!(fit.dy, 0.0);
    }

    #[test]
    fn test_erase_scales_all_channels() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.data_mut().copy_from_slice(&[200, 100, 50, 200, 200, 100, 50, 200]);
        let mut cov = Coverage::new(0, 0, 2, 1);
        cov.alpha = vec![1.0, 0.5];
        erase(&mut pixmap, &cov, None);
        assert_eq!(pixmap.data(), &[0, 0, 0, 0, 100, 50, 25, 100]);
    }

    #[test]
    fn test_erase_respects_clip() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.data_mut().fill(255);
        let mut clip = Mask::new(2, 1).unwrap();
        clip.data_mut().copy_from_slice(&[255, 0]);
        let mut cov = Coverage::new(0, 0, 2, 1);
        cov.alpha = vec![1.0, 1.0];
        erase(&mut pixmap, &cov, Some(&clip));
        assert_eq!(pixmap.data(), &[0, 0, 0, 0, 255, 255, 255, 255]);
    }

    #[test]
    fn test_erase_ignores_out_of_bounds() {
        let mut pixmap = Pixmap::new(2, 2).unwrap();
        pixmap.data_mut().fill(255);
        let mut cov = Coverage::new(-3, -3, 2, 2);
        cov.alpha = vec![1.0; 4];
        erase(&mut pixmap, &cov, None);
        assert!(pixmap.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_brush_stamp_is_solid_in_core() {
        let stamp = make_brush_stamp(15.0, 10.0);
        let d = (2 * stamp.radius + 1) as usize;
        let center = stamp.radius as usize;
        assert_eq!(stamp.weights[center * d + center], 1.0);
        assert_eq!(stamp.weights[center * d + center + 15], 1.0);
        let edge = stamp.weights[center * d + d - 1];
        assert!(edge > 0.0 && edge < 0.05);
    }

    #[test]
    fn test_dab_max_does_not_stack() {
        let stamp = make_brush_stamp(1.0, 2.0);
        let mut cov = Coverage::new(0, 0, 9, 9);
        dab_max(&mut cov, 4, 4, &stamp);
        let once = cov.alpha.clone();
        dab_max(&mut cov, 4, 4, &stamp);
        assert_eq!(cov.alpha, once);
    }

    #[test]
    fn test_premultiply_round_trip_to_rgb() {
        let img = RgbaImage::from_raw(1, 1, vec![255, 128, 0, 128]).unwrap();
        let pixmap = pixmap_from_image(&img).unwrap();
        assert_eq!(pixmap.data(), &[128, 64, 0, 128]);
        let rgb = pixmap_to_rgb(&pixmap).unwrap();
        assert_eq!(rgb.as_raw(), &vec![128, 64, 0]);
    }
}
