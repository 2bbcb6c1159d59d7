//! Feature projector: makes tabular figures the default digits.

use log::debug;

use crate::font::{Font, PosSubKind};

/// Rule-name prefix of tabular-numeral substitutions.
pub const TNUM_RULE_PREFIX: &str = "'tnum'";

/// Overwrite every glyph that has a tabular substitution with its substitute.
///
/// Only the first matching entry of a glyph is used. The substitution rule
/// stays in the font. Returns the number of glyphs overwritten.
pub fn enable_tnum(font: &mut impl Font) -> usize {
    let mut projected = 0;
    for glyph in font.glyphs() {
        let Some(entry) = glyph
            .pos_sub
            .iter()
            .find(|e| e.rule.starts_with(TNUM_RULE_PREFIX) && e.kind == PosSubKind::Substitution)
        else {
            continue;
        };

        if font.copy_glyph(entry.target, glyph.id) {
            debug!("tnum: {} <- {} ({})", glyph.name, entry.target, entry.rule);
            projected += 1;
        }
    }
    projected
}
