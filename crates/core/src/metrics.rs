//! Metric normalizer: puts both sources on the same design grid.

use log::debug;

use crate::font::{EmMetrics, Font};

/// Rescale `font` to the em size of `target` and adopt its ascent and descent.
///
/// Both sources must go through this with the same target before any stage
/// that compares or combines coordinates.
pub fn scale_em(font: &mut impl Font, target: EmMetrics) {
    if font.em() != target.em() {
        debug!("Rescaling em {} -> {}", font.em(), target.em());
        font.set_em(target.em());
    }
    font.set_metrics(target);
}
