//! The fog paint pipeline and the live surface it owns.
//!
//! Every paint redraws the whole surface in a fixed layer order:
//!
//! 1. clear
//! 2. clip to the window outline
//! 3. base layer (blurred background photo, or a radial gradient)
//! 4. tint and/or repeating noise
//! 5. the message, carved out with destination-out and a feathered edge
//! 6. a faint rim stroked along the outline
//!
//! Painting is idempotent: the same message and size always give the same pixels.

use crate::error::FogError;
use crate::font::Typeface;
use crate::message::MessageStore;
use crate::noise::{self, NoiseSettings};
use crate::path;
use crate::shape::ShapeModel;
use crate::text::{self, FitOptions, Truncation};
use crate::types::{Coverage, Rgba, UnitPoint};
use crate::vision;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, Mask, Paint, Pattern, Pixmap, PixmapPaint, Point, RadialGradient,
    Rect, SpreadMode, Stroke, Transform,
};

/* ------------------------------- settings ------------------------------- */

/// Which base layer fills the glass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogStyle {
    /// Blurred background photo (when loaded) under a cold tint and droplet noise.
    TintAndNoise {
        /// Gaussian sigma applied to the photo inside the glass.
        background_blur: f32,
        tint: Rgba,
        noise: NoiseSettings,
    },
    /// Condensation pooled by gravity: densest around `anchor`, below the centre.
    RadialGradient {
        anchor: UnitPoint,
        /// Gradient radius as a fraction of the larger surface side.
        radius_ratio: f32,
        inner: Rgba,
        outer: Rgba,
        noise: Option<NoiseSettings>,
    },
}

impl FogStyle {
    fn noise(&self) -> Option<&NoiseSettings> {
        match self {
            FogStyle::TintAndNoise { noise, .. } => Some(noise),
            FogStyle::RadialGradient { noise, .. } => noise.as_ref(),
        }
    }
}

/// Whether the window clip stays in effect after the fog layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipPolicy {
    /// Rim and later wipes may touch pixels outside the window.
    Release,
    /// Rim and later wipes stay confined to the window.
    KeepActive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveSettings {
    /// Hand-written tilt in degrees (negative = counter-clockwise).
    pub tilt_degrees: f32,
    /// Two-line layout: each line sits this many font sizes above/below the centre.
    pub line_offset: f32,
    /// Gaussian sigma of the soft edge around the letters.
    pub feather: f32,
}

impl Default for CarveSettings {
    fn default() -> Self {
        Self { tilt_degrees: -2.0, line_offset: 0.6, feather: 5.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RimSettings {
    pub color: Rgba,
    pub width: f32,
    /// Gaussian sigma; 0 draws a crisp rim.
    pub blur: f32,
}

impl Default for RimSettings {
    fn default() -> Self {
        Self { color: Rgba::new(255, 255, 255, 0.15), width: 2.0, blur: 0.0 }
    }
}

/// Everything one visual style needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogSettings {
    pub shape: ShapeModel,
    pub style: FogStyle,
    pub fit: FitOptions,
    #[serde(default)]
    pub carve: CarveSettings,
    #[serde(default)]
    pub rim: RimSettings,
    pub clip: ClipPolicy,
}

impl FogSettings {
    /// Curved side window, blurred photo + tint + noise, fine shrink steps.
    pub fn curved_window() -> Self {
        Self {
            shape: ShapeModel::curved_window(),
            style: FogStyle::TintAndNoise {
                background_blur: 6.0,
                tint: Rgba::new(220, 230, 240, 0.4),
                noise: NoiseSettings::default(),
            },
            fit: FitOptions {
                max_size: 100.0,
                min_size: 20.0,
                step: 2.0,
                max_chars: 35,
                truncation: Truncation::Always,
            },
            carve: CarveSettings::default(),
            rim: RimSettings::default(),
            clip: ClipPolicy::Release,
        }
    }

    /// Straight five-point window, gravity gradient, coarse shrink steps.
    pub fn straight_window() -> Self {
        Self {
            shape: ShapeModel::straight_window(),
            style: FogStyle::RadialGradient {
                anchor: UnitPoint::new(0.6, 0.9),
                radius_ratio: 0.8,
                inner: Rgba::new(232, 238, 244, 0.85),
                outer: Rgba::new(205, 215, 225, 0.45),
                noise: Some(NoiseSettings { opacity: 0.35, ..NoiseSettings::default() }),
            },
            fit: FitOptions {
                max_size: 120.0,
                min_size: 20.0,
                step: 5.0,
                max_chars: 35,
                truncation: Truncation::LongTokens,
            },
            carve: CarveSettings { tilt_degrees: -4.0, line_offset: 0.5, feather: 5.0 },
            rim: RimSettings { color: Rgba::new(255, 255, 255, 0.25), width: 3.0, blur: 2.0 },
            clip: ClipPolicy::KeepActive,
        }
    }
}

/* -------------------------------- surface -------------------------------- */

/// The live drawing target. Only the compositor resizes or clears it; the
/// compositor and the eraser paint on it.
pub struct Surface {
    pixmap: Pixmap,
    active: bool,
    /// Clip still in effect after the last paint (per `ClipPolicy`).
    clip: Option<Mask>,
}

impl Surface {
    fn new(width: u32, height: u32) -> Result<Self, FogError> {
        let pixmap = Pixmap::new(width, height).ok_or(FogError::InvalidSize { width, height })?;
        Ok(Self { pixmap, active: false, clip: None })
    }

    fn reallocate(&mut self, width: u32, height: u32) -> Result<(), FogError> {
        self.pixmap = Pixmap::new(width, height).ok_or(FogError::InvalidSize { width, height })?;
        self.clip = None;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// True once the fog has been revealed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn clip(&self) -> Option<&Mask> {
        self.clip.as_ref()
    }

    /// Destination-out wipe, confined to the clip if it is still active.
    pub fn erase(&mut self, coverage: &Coverage) {
        vision::erase(&mut self.pixmap, coverage, self.clip.as_ref());
    }
}

/* ------------------------------- compositor ------------------------------- */

pub struct FogCompositor {
    settings: FogSettings,
    typeface: Rc<dyn Typeface>,
    /// Rendered once, repeated as a pattern on every paint.
    noise: Option<Pixmap>,
    background: Option<Pixmap>,
    surface: Surface,
}

impl FogCompositor {
    pub fn new(settings: FogSettings, typeface: Rc<dyn Typeface>, width: u32, height: u32) -> Result<Self, FogError> {
        let noise = settings.style.noise().and_then(noise::noise_tile);
        Ok(Self {
            settings,
            typeface,
            noise,
            background: None,
            surface: Surface::new(width, height)?,
        })
    }

    pub fn settings(&self) -> &FogSettings {
        &self.settings
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn is_active(&self) -> bool {
        self.surface.active
    }

    pub fn background(&self) -> Option<&Pixmap> {
        self.background.as_ref()
    }

    /// Photo for the blurred base layer. Repaints right away if the fog is showing.
    pub fn set_background(&mut self, background: Option<Pixmap>, messages: &MessageStore) {
        self.background = background;
        if self.surface.active {
            self.paint(messages);
        }
    }

    /// First paint: the fog appears and later resizes repaint it.
    pub fn reveal(&mut self, messages: &MessageStore) {
        if !self.surface.active {
            log::info!("revealing fog at {}x{}", self.surface.width(), self.surface.height());
        }
        self.paint(messages);
        self.surface.active = true;
    }

    /// Hide the fog again: blank surface, back to the pre-reveal state.
    pub fn reset(&mut self) {
        log::debug!("fog reset");
        self.surface.pixmap.fill(Color::TRANSPARENT);
        self.surface.clip = None;
        self.surface.active = false;
    }

    /// New viewport size. Repaints when active, otherwise just records it.
    pub fn resize(&mut self, width: u32, height: u32, messages: &MessageStore) -> Result<(), FogError> {
        log::debug!("resize to {width}x{height} (active: {})", self.surface.active);
        self.surface.reallocate(width, height)?;
        if self.surface.active {
            self.paint(messages);
        }
        Ok(())
    }

    /// Redraw every layer from scratch.
    pub fn paint(&mut self, messages: &MessageStore) {
        let Self { settings, typeface, noise, background, surface } = self;
        let (w, h) = (surface.width(), surface.height());

        /* 1) Clear */
        surface.pixmap.fill(Color::TRANSPARENT);
        surface.clip = None;

        /* 2) Clipping mask: nothing below leaks outside the window */
        let Some(clip) = path::clip_mask(&settings.shape, w, h) else {
            log::warn!("no drawable window outline at {w}x{h}");
            return;
        };
        let Some(full) = Rect::from_xywh(0.0, 0.0, w as f32, h as f32) else { return };

        /* 3) Base layer */
        match &settings.style {
            FogStyle::TintAndNoise { background_blur, .. } => match background {
                Some(image) => paint_blurred_photo(&mut surface.pixmap, image, *background_blur, &clip),
                None => log::warn!("background image not loaded, skipping blurred layer"),
            },
            FogStyle::RadialGradient { anchor, radius_ratio, inner, outer, .. } => {
                let (cx, cy) = anchor.scale(w as f32, h as f32);
                let center = Point::from_xy(cx, cy);
                let radius = radius_ratio * w.max(h) as f32;
                let stops = vec![GradientStop::new(0.0, inner.to_skia()), GradientStop::new(1.0, outer.to_skia())];
                match RadialGradient::new(center, center, radius, stops, SpreadMode::Pad, Transform::identity()) {
                    Some(shader) => {
                        let paint = Paint { shader, anti_alias: true, ..Paint::default() };
                        surface.pixmap.fill_rect(full, &paint, Transform::identity(), Some(&clip));
                    }
                    None => log::warn!("degenerate fog gradient (radius {radius}), skipping"),
                }
            }
        }

        /* 4) Tint + droplet noise, normal blending */
        if let FogStyle::TintAndNoise { tint, .. } = &settings.style {
            let mut paint = Paint::default();
            paint.set_color(tint.to_skia());
            surface.pixmap.fill_rect(full, &paint, Transform::identity(), Some(&clip));
        }
        if let (Some(tile), Some(ns)) = (noise.as_ref(), settings.style.noise()) {
            let shader = Pattern::new(
                tile.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Nearest,
                ns.opacity,
                Transform::identity(),
            );
            let paint = Paint { shader, ..Paint::default() };
            surface.pixmap.fill_rect(full, &paint, Transform::identity(), Some(&clip));
        }

        /* 5) Message carved out of the fog */
        carve_message(&mut surface.pixmap, &clip, settings, typeface.as_ref(), messages.get());

        /* 6) Glass rim */
        let rim_clip = match settings.clip {
            ClipPolicy::KeepActive => Some(&clip),
            ClipPolicy::Release => None,
        };
        paint_rim(&mut surface.pixmap, &settings.shape, &settings.rim, rim_clip);

        surface.clip = match settings.clip {
            ClipPolicy::KeepActive => Some(clip),
            ClipPolicy::Release => None,
        };
    }
}

/// Cover-fit the photo on a scratch layer, frost it, then lay it into the window.
fn paint_blurred_photo(target: &mut Pixmap, image: &Pixmap, sigma: f32, clip: &Mask) {
    let Some(mut layer) = Pixmap::new(target.width(), target.height()) else { return };
    vision::draw_cover(&mut layer, image.as_ref(), None);
    vision::blur_pixmap(&mut layer, sigma);
    target.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), Some(clip));
}

fn carve_message(target: &mut Pixmap, clip: &Mask, settings: &FogSettings, typeface: &dyn Typeface, message: &str) {
    let (w, h) = (target.width(), target.height());
    let shape = &settings.shape;
    let carve = &settings.carve;

    let max_width = shape.text_width_ratio() * w as f32;
    let fitted = text::fit(message, max_width, typeface, &settings.fit);
    let size = fitted.font_size;
    log::debug!("carving {:?} at {size}px into {w}x{h}", fitted.lines);

    let Some(mut letters) = Mask::new(w, h) else { return };
    let (cx, cy) = shape.center().scale(w as f32, h as f32);
    let placed = Transform::from_translate(cx, cy).pre_concat(Transform::from_rotate(carve.tilt_degrees));
    let two_lines = fitted.lines.len() == 2;

    for (i, line) in fitted.lines.iter().enumerate() {
        let Some(glyphs) = typeface.outline(line, size) else { continue };
        let dy = match (two_lines, i) {
            (false, _) => 0.0,
            (true, 0) => -size * carve.line_offset,
            (true, _) => size * carve.line_offset,
        };
        let line_width = typeface.measure(line, size);
        let ts = placed.pre_translate(-line_width / 2.0, dy);
        letters.fill_path(&glyphs, FillRule::Winding, true, ts);
    }

    // Soft edge: a blurred copy under the crisp letters, like a shadow that also erases.
    let crisp = letters.data();
    let mut soft = crisp.to_vec();
    vision::gaussian_blur(&mut soft, w as usize, h as usize, 1, carve.feather);
    let alpha = crisp.iter().zip(&soft).map(|(&a, &b)| a.max(b) as f32 / 255.0).collect();

    let coverage = Coverage { x: 0, y: 0, width: w as usize, height: h as usize, alpha };
    vision::erase(target, &coverage, Some(clip));
}

fn paint_rim(target: &mut Pixmap, shape: &ShapeModel, rim: &RimSettings, clip: Option<&Mask>) {
    let Some(outline) = path::build_path(shape, target.width() as f32, target.height() as f32) else { return };
    let mut paint = Paint::default();
    paint.set_color(rim.color.to_skia());
    paint.anti_alias = true;
    let stroke = Stroke { width: rim.width, ..Stroke::default() };

    if rim.blur <= 0.0 {
        target.stroke_path(&outline, &paint, &stroke, Transform::identity(), clip);
        return;
    }

    // Soft vignette: stroke on a scratch layer and blur it first.
    let Some(mut layer) = Pixmap::new(target.width(), target.height()) else { return };
    layer.stroke_path(&outline, &paint, &stroke, Transform::identity(), None);
    vision::blur_pixmap(&mut layer, rim.blur);
    target.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), clip);
}
