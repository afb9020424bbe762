//! Field geometry and the normalized coordinate system.
//!
//! Every position stored on the board is expressed relative to the field
//! rectangle, not to the surface it is drawn on:
//!
//! ```text
//!  surface ───────────────────────────────────┐
//!  │   offset_x                               │
//!  │  ┌──────────────── field_w ───────────┐  │
//!  │  │(0,0)                               │  │
//!  │  │            relX = (px - offset_x)  │  │ offset_y
//!  │  │                   / field_w        │  │
//!  │  │                              (1,1) │  │
//!  │  └────────────────────────────────────┘  │
//!  └──────────────────────────────────────────┘
//! ```
//!
//! Both the interactive board and the raster compositor go through
//! [`FieldGeometry::to_absolute`], so a layout lands on the same pixels in
//! either context.

use serde::{Deserialize, Serialize};

/// Pitch proportions (105 m × 68 m).
pub const FIELD_ASPECT_RATIO: f64 = 105.0 / 68.0;

/// Share of the bounding surface dimension the field occupies.
pub const FIELD_FILL: f64 = 0.95;

/// A point in field-relative coordinates, nominally in `[0, 1] × [0, 1]`.
///
/// Values outside the unit square are legal: elements may be dragged onto
/// the margin around the pitch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormPoint {
    /// Fraction of the field width from its left edge.
    pub x: f64,
    /// Fraction of the field height from its top edge.
    pub y: f64,
}

impl NormPoint {
    /// Create a new normalized point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle of the given size centred on `(cx, cy)`.
    #[must_use]
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if a point lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Grow the rectangle by `margin` on every side.
    #[must_use]
    pub fn inflate(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }
}

/// Placement of the pitch rectangle inside a rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldGeometry {
    /// Horizontal offset of the field from the surface's left edge.
    pub offset_x: f64,
    /// Vertical offset of the field from the surface's top edge.
    pub offset_y: f64,
    /// Field width in pixels.
    pub field_w: f64,
    /// Field height in pixels.
    pub field_h: f64,
}

impl FieldGeometry {
    /// Zero-sized geometry returned for degenerate surfaces.
    pub const EMPTY: Self = Self {
        offset_x: 0.0,
        offset_y: 0.0,
        field_w: 0.0,
        field_h: 0.0,
    };

    /// Compute the field rectangle for a surface of the given size.
    ///
    /// The field keeps the 105:68 ratio and fills 95% of whichever surface
    /// dimension binds first; the remaining space is split evenly on both
    /// sides. Surfaces smaller than one pixel in either direction (or NaN)
    /// yield [`FieldGeometry::EMPTY`].
    #[must_use]
    pub fn compute(surface_w: f64, surface_h: f64) -> Self {
        if !(surface_w >= 1.0 && surface_h >= 1.0) {
            return Self::EMPTY;
        }

        let (field_w, field_h) = if surface_w / surface_h > FIELD_ASPECT_RATIO {
            let field_h = surface_h * FIELD_FILL;
            (field_h * FIELD_ASPECT_RATIO, field_h)
        } else {
            let field_w = surface_w * FIELD_FILL;
            (field_w, field_w / FIELD_ASPECT_RATIO)
        };

        Self {
            offset_x: (surface_w - field_w) / 2.0,
            offset_y: (surface_h - field_h) / 2.0,
            field_w,
            field_h,
        }
    }

    /// Whether coordinates can be converted through this geometry.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.field_w > 0.0 && self.field_h > 0.0
    }

    /// Convert surface pixels to field-relative coordinates.
    ///
    /// Returns `None` when the geometry is not ready.
    #[must_use]
    pub fn to_normalized(&self, px: f64, py: f64) -> Option<NormPoint> {
        if !self.is_ready() {
            return None;
        }
        Some(NormPoint::new(
            (px - self.offset_x) / self.field_w,
            (py - self.offset_y) / self.field_h,
        ))
    }

    /// Convert field-relative coordinates back to surface pixels.
    #[must_use]
    pub fn to_absolute(&self, point: NormPoint) -> (f64, f64) {
        (
            point.x * self.field_w + self.offset_x,
            point.y * self.field_h + self.offset_y,
        )
    }

    /// The field rectangle in surface pixels.
    #[must_use]
    pub fn field_rect(&self) -> Rect {
        Rect::new(self.offset_x, self.offset_y, self.field_w, self.field_h)
    }

    /// Pitch lines derived from this geometry.
    #[must_use]
    pub fn markings(&self) -> PitchMarkings {
        let outline = self.field_rect();
        let (cx, cy) = outline.center();
        let area_w = self.field_w * 0.17;
        let area_h = self.field_h * 0.5;

        PitchMarkings {
            outline,
            halfway: ((cx, outline.y), (cx, outline.bottom())),
            centre: (cx, cy),
            centre_radius: self.field_w * 0.1,
            left_area: Rect::new(outline.x, cy - area_h / 2.0, area_w, area_h),
            right_area: Rect::new(outline.right() - area_w, cy - area_h / 2.0, area_w, area_h),
        }
    }
}

/// Pitch lines for a given [`FieldGeometry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchMarkings {
    /// Touch and goal lines.
    pub outline: Rect,
    /// Halfway line endpoints.
    pub halfway: ((f64, f64), (f64, f64)),
    /// Centre spot.
    pub centre: (f64, f64),
    /// Centre circle radius.
    pub centre_radius: f64,
    /// Left penalty area.
    pub left_area: Rect,
    /// Right penalty area.
    pub right_area: Rect,
}

/// Distance from a point to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(px: f64, py: f64, a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return (px - a.0).hypot(py - a.1);
    }
    let t = (((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    (px - (a.0 + t * dx)).hypot(py - (a.1 + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACES: [(f64, f64); 8] = [
        (1.0, 1.0),
        (800.0, 600.0),
        (1600.0, 1200.0),
        (1920.0, 1080.0),
        (450.0, 650.0),
        (3000.0, 200.0),
        (105.0, 68.0),
        (1.0, 5000.0),
    ];

    #[test]
    fn test_ratio_and_offsets() {
        for (w, h) in SURFACES {
            let g = FieldGeometry::compute(w, h);
            assert!(g.is_ready(), "{w}x{h} should be ready");
            assert!((g.field_w / g.field_h - FIELD_ASPECT_RATIO).abs() < 1e-9);
            assert!(g.offset_x >= 0.0 && g.offset_y >= 0.0);
            assert!(g.field_w <= w && g.field_h <= h);
        }
    }

    #[test]
    fn test_800x600() {
        let g = FieldGeometry::compute(800.0, 600.0);
        assert!((g.field_w - 760.0).abs() < 1e-9);
        assert!((g.field_h - 760.0 * 68.0 / 105.0).abs() < 1e-9);
        assert!((g.offset_x - 20.0).abs() < 1e-9);
        assert!((g.offset_y - (600.0 - g.field_h) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_wide_surface_binds_height() {
        let g = FieldGeometry::compute(3000.0, 200.0);
        assert!((g.field_h - 190.0).abs() < 1e-9);
        assert!((g.offset_y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_surface() {
        assert_eq!(FieldGeometry::compute(0.0, 600.0), FieldGeometry::EMPTY);
        assert_eq!(FieldGeometry::compute(800.0, 0.5), FieldGeometry::EMPTY);
        assert_eq!(FieldGeometry::compute(f64::NAN, 600.0), FieldGeometry::EMPTY);
        assert!(!FieldGeometry::EMPTY.is_ready());
        assert!(FieldGeometry::EMPTY.to_normalized(10.0, 10.0).is_none());
    }

    #[test]
    fn test_normalize_round_trip() {
        for (w, h) in SURFACES {
            let g = FieldGeometry::compute(w, h);
            let rect = g.field_rect();
            for (fx, fy) in [(0.0, 0.0), (0.25, 0.75), (0.5, 0.5), (1.0, 1.0)] {
                let px = rect.x + rect.width * fx;
                let py = rect.y + rect.height * fy;
                let rel = g.to_normalized(px, py).expect("ready");
                let (bx, by) = g.to_absolute(rel);
                assert!((bx - px).abs() < 1e-9 && (by - py).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_corners_map_to_unit_square() {
        let g = FieldGeometry::compute(1024.0, 768.0);
        let top_left = g.to_normalized(g.offset_x, g.offset_y).expect("ready");
        assert!(top_left.x.abs() < 1e-12 && top_left.y.abs() < 1e-12);
        let bottom_right = g
            .to_normalized(g.offset_x + g.field_w, g.offset_y + g.field_h)
            .expect("ready");
        assert!((bottom_right.x - 1.0).abs() < 1e-12);
        assert!((bottom_right.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_markings_inside_outline() {
        let g = FieldGeometry::compute(800.0, 600.0);
        let m = g.markings();
        assert!((m.centre_radius - 76.0).abs() < 1e-9);
        assert!((m.left_area.x - m.outline.x).abs() < 1e-9);
        assert!((m.right_area.right() - m.outline.right()).abs() < 1e-9);
        assert!((m.halfway.0 .0 - m.centre.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_to_segment() {
        assert!((distance_to_segment(5.0, 3.0, (0.0, 0.0), (10.0, 0.0)) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(-4.0, 3.0, (0.0, 0.0), (10.0, 0.0)) - 5.0).abs() < 1e-12);
        assert!((distance_to_segment(3.0, 4.0, (0.0, 0.0), (0.0, 0.0)) - 5.0).abs() < 1e-12);
    }
}
