//! Editable glyph outlines.
//!
//! Points are kept in `f64` until the font is written, so repeated rescales
//! and shears do not accumulate rounding error.

use kurbo::{Affine, Point, Rect, Vec2};
use read_fonts::tables::glyf::{CurvePoint, SimpleGlyph as ReadSimpleGlyph};
use write_fonts::tables::glyf::{Bbox, Contour, Glyph, SimpleGlyph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub point: Point,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn new(x: f64, y: f64, on_curve: bool) -> Self {
        Self { point: Point::new(x, y), on_curve }
    }
}

pub type OutlineContour = Vec<OutlinePoint>;

/// A reference to another glyph of the same font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub glyph: u32,
    pub affine: Affine,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub contours: Vec<OutlineContour>,
    pub components: Vec<Component>,
}

impl Outline {
    pub fn from_simple(simple: &ReadSimpleGlyph) -> Self {
        let mut contours = Vec::new();
        let mut points = simple.points();
        let mut current_point = 0usize;

        for end_pt in simple.end_pts_of_contours() {
            let end = end_pt.get() as usize;
            let mut contour = Vec::new();
            while current_point <= end {
                if let Some(pt) = points.next() {
                    contour.push(OutlinePoint::new(pt.x.into(), pt.y.into(), pt.on_curve));
                }
                current_point += 1;
            }
            contours.push(contour);
        }

        Self { contours, components: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty() && self.components.is_empty()
    }

    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }

    /// Apply `affine` to every point. Components must have been resolved first.
    pub fn transform_contours(&mut self, affine: Affine) {
        for point in self.contours.iter_mut().flatten() {
            point.point = affine * point.point;
        }
    }

    /// Uniform scale for an em change.
    ///
    /// Referenced glyphs are scaled on their own, so only the offsets of the
    /// components change.
    pub fn scale(&mut self, factor: f64) {
        self.transform_contours(Affine::scale(factor));
        for component in &mut self.components {
            let [a, b, c, d, e, f] = component.affine.as_coeffs();
            component.affine = Affine::new([a, b, c, d, e * factor, f * factor]);
        }
    }

    /// Bounding box of the control points.
    pub fn control_box(&self) -> Option<Rect> {
        let mut points = self.contours.iter().flatten().map(|p| p.point);
        let first = points.next()?;
        Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
    }

    /// The glyph as written to `glyf`, without hinting.
    pub fn to_glyph(&self) -> Glyph {
        let contours: Vec<Contour> = self
            .contours
            .iter()
            .filter(|contour| !contour.is_empty())
            .map(|contour| {
                Contour::from(
                    contour
                        .iter()
                        .map(|p| CurvePoint {
                            x: to_fword(p.point.x),
                            y: to_fword(p.point.y),
                            on_curve: p.on_curve,
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let Some(bbox) = self.control_box() else {
            return Glyph::Empty;
        };
        if contours.is_empty() {
            return Glyph::Empty;
        }

        Glyph::Simple(SimpleGlyph {
            bbox: Bbox {
                x_min: to_fword(bbox.x0),
                y_min: to_fword(bbox.y0),
                x_max: to_fword(bbox.x1),
                y_max: to_fword(bbox.y1),
            },
            contours,
            instructions: vec![],
        })
    }
}

/// Component transform as read from a composite glyph record.
pub fn component_affine(xx: f64, yx: f64, xy: f64, yy: f64, offset: Vec2) -> Affine {
    Affine::new([xx, yx, xy, yy, offset.x, offset.y])
}

pub(crate) fn to_fword(v: f64) -> i16 {
    v.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
