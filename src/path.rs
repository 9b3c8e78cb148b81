// Unit-square outline -> concrete drawable path at the live surface size.
// Visual: the same path is the fog's clip region and the glass rim stroke.
use crate::shape::{Outline, ShapeModel};
use tiny_skia::{FillRule, Mask, Path, PathBuilder, Transform};

/// Scale every outline point by `(width, height)` and trace it.
/// Returns `None` only for a zero or non-finite surface size.
pub fn build_path(shape: &ShapeModel, width: f32, height: f32) -> Option<Path> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }

    let mut pb = PathBuilder::new();
    match shape.outline() {
        Outline::Polygon(points) => {
            let mut iter = points.iter().map(|p| p.scale(width, height));
            let (x, y) = iter.next()?;
            pb.move_to(x, y);
            for (x, y) in iter {
                pb.line_to(x, y);
            }
        }
        Outline::Curved { tl, tr, br, bl, top, bottom } => {
            let (x, y) = tl.scale(width, height);
            pb.move_to(x, y);

            // Top edge bulges towards `top`
            let (cx, cy) = top.scale(width, height);
            let (x, y) = tr.scale(width, height);
            pb.quad_to(cx, cy, x, y);

            // Right side is straight
            let (x, y) = br.scale(width, height);
            pb.line_to(x, y);

            // Bottom edge bends towards `bottom`
            let (cx, cy) = bottom.scale(width, height);
            let (x, y) = bl.scale(width, height);
            pb.quad_to(cx, cy, x, y);
        }
    }
    pb.close();
    pb.finish()
}

/// Anti-aliased coverage of the outline: 255 inside, 0 outside, soft on the edge.
pub fn clip_mask(shape: &ShapeModel, width: u32, height: u32) -> Option<Mask> {
    let path = build_path(shape, width as f32, height as f32)?;
    let mut mask = Mask::new(width, height)?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Some(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitPoint;

    #[test]
    fn test_build_path_is_deterministic() {
        for shape in [ShapeModel::curved_window(), ShapeModel::straight_window()] {
            let a = build_path(&shape, 1280.0, 720.0).unwrap();
            let b = build_path(&shape, 1280.0, 720.0).unwrap();
            assert_eq!(a.verbs(), b.verbs());
            for (pa, pb) in a.points().iter().zip(b.points()) {
                assert!((pa.x - pb.x).abs() < 1e-4 && (pa.y - pb.y).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_polygon_points_are_scaled() {
        let shape = ShapeModel::new(
            Outline::Polygon(vec![UnitPoint::new(0.0, 0.0), UnitPoint::new(1.0, 0.0), UnitPoint::new(0.5, 1.0)]),
            UnitPoint::new(0.5, 0.5),
            0.5,
        )
        .unwrap();
        let path = build_path(&shape, 200.0, 100.0).unwrap();
        let pts: Vec<(f32, f32)> = path.points().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(&pts[..3], &[(0.0, 0.0), (200.0, 0.0), (100.0, 100.0)]);
    }

    #[test]
    fn test_curved_outline_uses_control_points() {
        let path = build_path(&ShapeModel::curved_window(), 100.0, 100.0).unwrap();
        let bounds = path.bounds();
        // The top curve is pulled upwards past both top corners (y=24 and y=28)
        assert!(bounds.top() < 24.0);
        assert!((bounds.left() - 38.0).abs() < 1e-3);
        assert!((bounds.right() - 92.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_size_has_no_path() {
        assert!(build_path(&ShapeModel::curved_window(), 0.0, 100.0).is_none());
        assert!(clip_mask(&ShapeModel::curved_window(), 0, 10).is_none());
    }

    #[test]
    fn test_clip_mask_covers_center_only() {
        let shape = ShapeModel::curved_window();
        let mask = clip_mask(&shape, 200, 100).unwrap();
        let at = |x: usize, y: usize| mask.data()[y * 200 + x];
        assert_eq!(at(130, 45), 255);
        assert_eq!(at(10, 10), 0);
        assert_eq!(at(195, 95), 0);
    }
}
