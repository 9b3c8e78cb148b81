// Finger-on-the-glass erasing.
// Visual: press and drag to wipe soft, round-ended trails out of the fog.
use crate::compositor::Surface;
use crate::types::{Coverage, Stamp};
use crate::vision::{dab_max, make_brush_stamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Width of the fully wiped core, in pixels.
    pub width: f32,
    /// Extra soft edge around the core, in pixels.
    pub feather: f32,
    /// Distance between dabs along a segment, in pixels.
    pub spacing: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self { width: 30.0, feather: 10.0, spacing: 2.0 }
    }
}

/// Where a pointer event came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { x: f32, y: f32 },
    /// All current touch points; only the first one wipes.
    Touch(Vec<(f32, f32)>),
}

impl PointerInput {
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            PointerInput::Mouse { x, y } => Some((*x, *y)),
            PointerInput::Touch(points) => points.first().copied(),
        }
    }

    pub fn is_touch(&self) -> bool {
        matches!(self, PointerInput::Touch(_))
    }
}

/// What the caller should do with the platform's own handling of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputResponse {
    /// Touch drags must not scroll or zoom the page.
    pub suppress_default: bool,
}

/// Per-gesture state: lives from pointer-down to pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrokeSession {
    pub active: bool,
    pub last_point: Option<(f32, f32)>,
}

pub struct ErasureStroke {
    brush: BrushSettings,
    stamp: Stamp,
    session: StrokeSession,
}

impl ErasureStroke {
    pub fn new(brush: BrushSettings) -> Self {
        let stamp = make_brush_stamp(brush.width / 2.0, brush.feather);
        Self { brush, stamp, session: StrokeSession::default() }
    }

    pub fn session(&self) -> StrokeSession {
        self.session
    }

    /// Start a wipe and clear a dot right under the finger.
    pub fn pointer_down(&mut self, surface: &mut Surface, input: &PointerInput) -> InputResponse {
        let response = InputResponse { suppress_default: input.is_touch() };
        let Some(p) = input.position() else { return response };
        self.session = StrokeSession { active: true, last_point: Some(p) };
        self.erase_segment(surface, p, p);
        response
    }

    /// Continue the wipe from the last point. Ignored when no wipe is in progress.
    pub fn pointer_move(&mut self, surface: &mut Surface, input: &PointerInput) -> InputResponse {
        let response = InputResponse { suppress_default: input.is_touch() };
        if !self.session.active {
            return response;
        }
        let Some(p) = input.position() else { return response };
        let from = self.session.last_point.unwrap_or(p);
        self.erase_segment(surface, from, p);
        self.session.last_point = Some(p);
        response
    }

    /// End the wipe; the next one starts a fresh path.
    pub fn pointer_up(&mut self) {
        self.session = StrokeSession::default();
    }

    /// Stamp the brush every `spacing` pixels from `from` to `to`, then wipe once.
    fn erase_segment(&self, surface: &mut Surface, from: (f32, f32), to: (f32, f32)) {
        let r = self.stamp.radius;
        let (sw, sh) = (surface.width() as i32, surface.height() as i32);

        // Only the part of the segment a dab could reach is stamped
        let reach = (-r as f32, -r as f32, (sw + r) as f32, (sh + r) as f32);
        let Some((from, to)) = clip_segment(from, to, reach) else {
            return; // visual: wiping off-screen changes nothing
        };

        // Bounding box of the segment plus brush, limited to the surface
        let x0 = (from.0.min(to.0).floor() as i32).saturating_sub(r).max(0);
        let y0 = (from.1.min(to.1).floor() as i32).saturating_sub(r).max(0);
        let x1 = (from.0.max(to.0).ceil() as i32).saturating_add(r + 1).min(sw);
        let y1 = (from.1.max(to.1).ceil() as i32).saturating_add(r + 1).min(sh);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let mut coverage = Coverage::new(x0, y0, (x1 - x0) as usize, (y1 - y0) as usize);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let dist = (dx * dx + dy * dy).sqrt();
        let steps = (dist / self.brush.spacing.max(0.5)).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (from.0 + dx * t).round() as i32;
            let y = (from.1 + dy * t).round() as i32;
            dab_max(&mut coverage, x, y, &self.stamp);
        }

        log::trace!("wipe ({:.0},{:.0}) -> ({:.0},{:.0})", from.0, from.1, to.0, to.1);
        surface.erase(&coverage);
    }
}

/// Liang-Barsky: the part of `from -> to` inside the rect `(x0, y0, x1, y1)`.
/// `None` when the segment misses it or a coordinate is not finite.
fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    (x0, y0, x1, y1): (f32, f32, f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [(-dx, from.0 - x0), (dx, x1 - from.0), (-dy, from.1 - y0), (dy, y1 - from.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None; // parallel to this edge and outside it
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f32| (from.0 + dx * t, from.1 + dy * t);
    Some((at(t0), at(t1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{FogCompositor, FogSettings};
    use crate::font::BlockFont;
    use crate::message::MessageStore;
    use std::rc::Rc;

    fn revealed(settings: FogSettings) -> FogCompositor {
        let mut fog = FogCompositor::new(settings, Rc::new(BlockFont), 300, 200).unwrap();
        fog.reveal(&MessageStore::new("."));
        fog
    }

    fn alpha_at(surface: &Surface, x: u32, y: u32) -> u8 {
        surface.pixmap().data()[((y * surface.width() + x) * 4 + 3) as usize]
    }

    fn drag(eraser: &mut ErasureStroke, surface: &mut Surface, points: &[(f32, f32)]) {
        let (first, rest) = points.split_first().unwrap();
        eraser.pointer_down(surface, &PointerInput::Mouse { x: first.0, y: first.1 });
        for p in rest {
            eraser.pointer_move(surface, &PointerInput::Mouse { x: p.0, y: p.1 });
        }
        eraser.pointer_up();
    }

    #[test]
    fn test_same_stroke_gives_same_pixels() {
        let path = [(130.0, 70.0), (160.0, 80.0), (230.0, 95.0)];
        let mut a = revealed(FogSettings::curved_window());
        let mut b = revealed(FogSettings::curved_window());
        drag(&mut ErasureStroke::new(BrushSettings::default()), a.surface_mut(), &path);
        drag(&mut ErasureStroke::new(BrushSettings::default()), b.surface_mut(), &path);
        assert_eq!(a.surface().pixmap().data(), b.surface().pixmap().data());
    }

    #[test]
    fn test_pointer_down_wipes_a_dot() {
        let mut fog = revealed(FogSettings::curved_window());
        assert!(alpha_at(fog.surface(), 150, 70) > 0);
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        eraser.pointer_down(fog.surface_mut(), &PointerInput::Mouse { x: 150.0, y: 70.0 });
        assert_eq!(alpha_at(fog.surface(), 150, 70), 0);
        assert!(eraser.session().active);
    }

    #[test]
    fn test_drag_wipes_between_points() {
        let mut fog = revealed(FogSettings::curved_window());
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        drag(&mut eraser, fog.surface_mut(), &[(130.0, 80.0), (250.0, 80.0)]);
        for x in [140, 190, 240] {
            assert_eq!(alpha_at(fog.surface(), x, 80), 0, "x = {x}");
        }
        assert_eq!(eraser.session(), StrokeSession::default());
    }

    #[test]
    fn test_move_without_press_does_nothing() {
        let mut fog = revealed(FogSettings::curved_window());
        let before = fog.surface().pixmap().data().to_vec();
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        eraser.pointer_move(fog.surface_mut(), &PointerInput::Mouse { x: 150.0, y: 80.0 });
        assert_eq!(fog.surface().pixmap().data(), &before[..]);
    }

    #[test]
    fn test_touch_uses_first_point_and_blocks_scrolling() {
        let mut fog = revealed(FogSettings::curved_window());
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        let touch = PointerInput::Touch(vec![(150.0, 70.0), (10.0, 10.0)]);
        assert!(eraser.pointer_down(fog.surface_mut(), &touch).suppress_default);
        assert!(eraser.pointer_move(fog.surface_mut(), &touch).suppress_default);
        assert_eq!(eraser.session().last_point, Some((150.0, 70.0)));
        let mouse = PointerInput::Mouse { x: 150.0, y: 70.0 };
        assert!(!eraser.pointer_move(fog.surface_mut(), &mouse).suppress_default);
    }

    #[test]
    fn test_empty_touch_list_is_ignored() {
        let mut fog = revealed(FogSettings::curved_window());
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        eraser.pointer_down(fog.surface_mut(), &PointerInput::Touch(vec![]));
        assert!(!eraser.session().active);
    }

    #[test]
    fn test_wipe_goes_through_a_kept_clip() {
        let mut fog = revealed(FogSettings::straight_window());
        assert!(fog.surface().clip().is_some());
        assert!(alpha_at(fog.surface(), 100, 70) > 0);
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        drag(&mut eraser, fog.surface_mut(), &[(100.0, 70.0)]);
        assert_eq!(alpha_at(fog.surface(), 100, 70), 0);
    }

    #[test]
    fn test_huge_coordinates_do_not_overflow() {
        let mut fog = revealed(FogSettings::curved_window());
        let before = fog.surface().pixmap().data().to_vec();
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        eraser.pointer_down(fog.surface_mut(), &PointerInput::Mouse { x: 3.0e9, y: 10.0 });
        eraser.pointer_move(fog.surface_mut(), &PointerInput::Mouse { x: -3.0e9, y: 1.0e9 });
        eraser.pointer_move(fog.surface_mut(), &PointerInput::Mouse { x: f32::NAN, y: 10.0 });
        assert_eq!(fog.surface().pixmap().data(), &before[..]);
    }

    #[test]
    fn test_far_jump_wipes_only_the_visible_part() {
        let mut fog = revealed(FogSettings::curved_window());
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        drag(&mut eraser, fog.surface_mut(), &[(150.0, 70.0), (200_000.0, 70.0)]);
        for x in [150, 200, 250] {
            assert_eq!(alpha_at(fog.surface(), x, 70), 0, "x = {x}");
        }
        // well below the trail, still misted
        assert!(alpha_at(fog.surface(), 150, 115) > 0);
    }

    #[test]
    fn test_clip_segment_cuts_to_rect() {
        let rect = (0.0, 0.0, 100.0, 50.0);
        let (a, b) = clip_segment((-50.0, 10.0), (1.0e6, 10.0), rect).unwrap();
        assert!(a.0.abs() < 0.5 && a.1 == 10.0, "{a:?}");
        assert!((b.0 - 100.0).abs() < 0.5 && b.1 == 10.0, "{b:?}");
        assert!(clip_segment((-5.0, 60.0), (200.0, 60.0), rect).is_none());
        assert!(clip_segment((10.0, 10.0), (10.0, 10.0), rect).is_some());
    }

    #[test]
    fn test_off_surface_wipe_is_harmless() {
        let mut fog = revealed(FogSettings::curved_window());
        let before = fog.surface().pixmap().data().to_vec();
        let mut eraser = ErasureStroke::new(BrushSettings::default());
        drag(&mut eraser, fog.surface_mut(), &[(-500.0, -500.0), (-400.0, -450.0)]);
        assert_eq!(fog.surface().pixmap().data(), &before[..]);
    }
}
