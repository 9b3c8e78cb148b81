// Static window geometry in unit-square coordinates.
// Visual: decides where the fog is allowed to exist and where the text sits.
use crate::error::ShapeError;
use crate::types::UnitPoint;
use serde::{Deserialize, Serialize};

/// How the window edge is traced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outline {
    /// Straight segments between consecutive points, closed back to the first.
    Polygon(Vec<UnitPoint>),
    /// Four corners; `top` bends the tl→tr edge and `bottom` bends br→bl.
    /// Left and right sides stay straight.
    Curved {
        tl: UnitPoint,
        tr: UnitPoint,
        br: UnitPoint,
        bl: UnitPoint,
        top: UnitPoint,
        bottom: UnitPoint,
    },
}

impl Outline {
    /// The corner polygon (control points excluded).
    pub fn corners(&self) -> Vec<UnitPoint> {
        match self {
            Outline::Polygon(points) => points.clone(),
            Outline::Curved { tl, tr, br, bl, .. } => vec![*tl, *tr, *br, *bl],
        }
    }
}

/// Immutable once built; `new` enforces the invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawShape", into = "RawShape")]
pub struct ShapeModel {
    outline: Outline,
    center: UnitPoint,
    text_width_ratio: f32,
}

#[derive(Serialize, Deserialize)]
struct RawShape {
    outline: Outline,
    center: UnitPoint,
    text_width_ratio: f32,
}

impl TryFrom<RawShape> for ShapeModel {
    type Error = ShapeError;

    fn try_from(raw: RawShape) -> Result<Self, Self::Error> {
        ShapeModel::new(raw.outline, raw.center, raw.text_width_ratio)
    }
}

impl From<ShapeModel> for RawShape {
    fn from(shape: ShapeModel) -> Self {
        RawShape {
            outline: shape.outline,
            center: shape.center,
            text_width_ratio: shape.text_width_ratio,
        }
    }
}

impl ShapeModel {
    pub fn new(outline: Outline, center: UnitPoint, text_width_ratio: f32) -> Result<Self, ShapeError> {
        let corners = outline.corners();
        if corners.len() < 3 {
            return Err(ShapeError::TooFewPoints(corners.len()));
        }

        let mut all = corners.clone();
        if let Outline::Curved { top, bottom, .. } = &outline {
            all.push(*top);
            all.push(*bottom);
        }
        all.push(center);
        for (index, p) in all.iter().enumerate() {
            if !p.in_unit_square() {
                return Err(ShapeError::OutOfUnitSquare { index, x: p.x, y: p.y });
            }
        }

        if !(text_width_ratio > 0.0 && text_width_ratio <= 1.0) {
            return Err(ShapeError::TextWidthRatio(text_width_ratio));
        }

        if let Some((a, b)) = first_crossing(&corners) {
            return Err(ShapeError::SelfIntersecting(a, b));
        }

        Ok(Self { outline, center, text_width_ratio })
    }

    /// Car side window with a bulging top edge and a slightly lifted bottom edge.
    pub fn curved_window() -> Self {
        Self {
            outline: Outline::Curved {
                tl: UnitPoint::new(0.38, 0.28),
                tr: UnitPoint::new(0.92, 0.24),
                br: UnitPoint::new(0.92, 0.58),
                bl: UnitPoint::new(0.38, 0.65),
                top: UnitPoint::new(0.65, 0.22),
                bottom: UnitPoint::new(0.65, 0.63),
            },
            center: UnitPoint::new(0.65, 0.45),
            // 80% of the window's top edge span (0.92 - 0.38)
            text_width_ratio: 0.432,
        }
    }

    /// Five-point straight-edged window with a raked front pillar.
    pub fn straight_window() -> Self {
        Self {
            outline: Outline::Polygon(vec![
                UnitPoint::new(0.30, 0.30),
                UnitPoint::new(0.78, 0.26),
                UnitPoint::new(0.90, 0.42),
                UnitPoint::new(0.88, 0.62),
                UnitPoint::new(0.30, 0.66),
            ]),
            center: UnitPoint::new(0.60, 0.46),
            text_width_ratio: 0.45,
        }
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn center(&self) -> UnitPoint {
        self.center
    }

    pub fn text_width_ratio(&self) -> f32 {
        self.text_width_ratio
    }
}

/// Returns the first pair of non-adjacent closed-polygon edges that cross.
fn first_crossing(points: &[UnitPoint]) -> Option<(usize, usize)> {
    let n = points.len();
    let edge = |i: usize| (points[i], points[(i + 1) % n]);
    for i in 0..n {
        for j in (i + 1)..n {
            // Adjacent edges share an endpoint; that is not a crossing.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (a0, a1) = edge(i);
            let (b0, b1) = edge(j);
            if segments_cross(a0, a1, b0, b1) {
                return Some((i, j));
            }
        }
    }
    None
}

fn cross(o: UnitPoint, a: UnitPoint, b: UnitPoint) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(p: UnitPoint, a: UnitPoint, b: UnitPoint) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_cross(a0: UnitPoint, a1: UnitPoint, b0: UnitPoint, b1: UnitPoint) -> bool {
    let d1 = cross(b0, b1, a0);
    let d2 = cross(b0, b1, a1);
    let d3 = cross(a0, a1, b0);
    let d4 = cross(a0, a1, b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear touching counts too: the polygon would not be simple.
    (d1 == 0.0 && on_segment(a0, b0, b1))
        || (d2 == 0.0 && on_segment(a1, b0, b1))
        || (d3 == 0.0 && on_segment(b0, a0, a1))
        || (d4 == 0.0 && on_segment(b1, a0, a1))
}
