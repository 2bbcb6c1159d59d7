//! Slant transformer for the italic styles.

use kurbo::{Affine, Vec2};
use log::info;

use crate::{
    font::{EmMetrics, Font, TransformOptions},
    glyph_set::GlyphSet,
};

/// Shear applied to upright glyphs to make them oblique.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlantTransform {
    /// Slant in degrees, positive leaning right.
    pub angle: f64,
    /// `tan(angle)`.
    pub shear: f64,
    /// Horizontal shift keeping the vertical center of the em box in place.
    pub translate_x: f64,
}

impl SlantTransform {
    pub fn new(angle: f64, metrics: EmMetrics) -> Self {
        let shear = angle.to_radians().tan();
        let center = (f64::from(metrics.ascent) - f64::from(metrics.descent)) / 2.0;
        Self { angle, shear, translate_x: -shear * center }
    }

    /// Skew first, then translate.
    pub fn affine(&self) -> Affine {
        Affine::translate(Vec2::new(self.translate_x, 0.0)) * Affine::skew(self.shear, 0.0)
    }

    /// Value stored in the italic-angle field (negative leans right).
    pub fn italic_angle(&self) -> f64 {
        -self.angle
    }
}

/// Slant every worth-outputting glyph of `font` by `angle` degrees.
///
/// Advance widths are left untouched.
pub fn italicize(font: &mut impl Font, angle: f64) -> SlantTransform {
    let slant = SlantTransform::new(angle, font.metrics());
    font.info_mut().italic_angle = slant.italic_angle();

    let selection = GlyphSet::worth_outputting(font);
    font.transform(&selection, slant.affine(), TransformOptions::NO_WIDTH);

    info!("Slanted {} glyphs by {angle}°", selection.len());
    slant
}
