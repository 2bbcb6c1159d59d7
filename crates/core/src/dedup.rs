//! Deduplicator: the Latin source wins for every codepoint it defines.

use log::{debug, info};

use crate::font::Font;

/// Clear from `script` every glyph whose codepoint is also carried by an
/// output-worthy glyph of `latin`.
///
/// Unencoded glyphs are left alone in both fonts. Returns the number of
/// glyphs cleared.
pub fn clear_duplicate_glyphs(script: &mut impl Font, latin: &impl Font) -> usize {
    let mut cleared = 0;
    for glyph in latin.glyphs() {
        if !glyph.worth_outputting {
            continue;
        }
        let Some(codepoint) = glyph.valid_codepoint() else {
            continue;
        };
        if let Some(duplicate) = script.glyph_by_codepoint(codepoint) {
            debug!("Clearing {codepoint} ({duplicate}) from the script source");
            script.clear_glyph(duplicate);
            cleared += 1;
        }
    }
    info!("Cleared {cleared} duplicate glyphs");
    cleared
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::testing::{MockFont, MockGlyph};

    fn encoded_worth(font: &impl Font) -> HashSet<u32> {
        font.glyphs()
            .into_iter()
            .filter(|g| g.worth_outputting)
            .filter_map(|g| g.valid_codepoint())
            .map(|cp| cp.to_u32())
            .collect()
    }

    #[test]
    fn test_disjoint_after_dedup() {
        let mut ja = MockFont::new(vec![
            MockGlyph::new(".notdef"),
            MockGlyph::new("A").codepoint(0x41),
            MockGlyph::new("one").codepoint(0x31),
            MockGlyph::new("uni3042").codepoint(0x3042),
            MockGlyph::new("fi"),
        ]);
        let en = MockFont::new(vec![
            MockGlyph::new(".notdef"),
            MockGlyph::new("A").codepoint(0x41),
            MockGlyph::new("one").codepoint(0x31),
            MockGlyph::new("fi"),
            MockGlyph::new("unused").codepoint(0x3042).empty(),
        ]);

        assert_eq!(clear_duplicate_glyphs(&mut ja, &en), 2);

        let ja_set = encoded_worth(&ja);
        let en_set = encoded_worth(&en);
        assert!(ja_set.is_disjoint(&en_set));
        assert!(ja_set.contains(&0x3042));
        // unencoded glyphs coexist
        assert!(ja.glyphs[4].worth());
        // slots are kept
        assert_eq!(ja.glyphs.len(), 5);
    }

    #[test]
    fn test_zero_codepoint_is_ignored() {
        let mut ja = MockFont::new(vec![MockGlyph::new("null").codepoint(0)]);
        let en = MockFont::new(vec![MockGlyph::new("null").codepoint(0)]);
        assert_eq!(clear_duplicate_glyphs(&mut ja, &en), 0);
        assert!(ja.glyphs[0].worth());
    }
}
