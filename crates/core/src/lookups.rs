//! Lookup pruner.

use log::debug;

use crate::font::{Font, LookupKind};

/// Remove every substitution and/or positioning lookup from `font`.
///
/// Glyphs referenced only by removed lookups stay in the font. Returns the
/// number of lookups removed.
pub fn remove_lookups(font: &mut impl Font, remove_gsub: bool, remove_gpos: bool) -> usize {
    let kinds = [
        (remove_gsub, LookupKind::Substitution),
        (remove_gpos, LookupKind::Positioning),
    ];

    let mut removed = 0;
    for kind in kinds.into_iter().filter_map(|(remove, kind)| remove.then_some(kind)) {
        for lookup in font.lookups(kind) {
            debug!("Removing {lookup}");
            font.remove_lookup(lookup);
            removed += 1;
        }
    }
    removed
}
