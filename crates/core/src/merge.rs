//! Merger: folds the Latin font into the script font.

use std::path::Path;

use log::info;

use crate::{
    Error, Result,
    font::{Font, FontEngine},
    temp::TempFile,
};

/// Merge `secondary` into `primary` through a scratch file in `scratch_dir`.
///
/// `secondary` is consumed: it is serialized, released, and read back into
/// `primary`. On codepoint conflicts the glyph already in `primary` wins.
/// The scratch file is removed whether or not the merge succeeds.
pub fn merge_fonts<E: FontEngine>(
    engine: &E,
    primary: &mut E::Font,
    secondary: E::Font,
    scratch_dir: &Path,
) -> Result<()> {
    let scratch = TempFile::create(scratch_dir, E::INTERCHANGE_EXTENSION)?;

    engine.save(&secondary, scratch.path()).map_err(Error::engine)?;
    drop(secondary);

    let before = primary.num_glyphs();
    engine.merge_from(primary, scratch.path()).map_err(Error::engine)?;

    info!("Merged {} glyphs into the script font", primary.num_glyphs().saturating_sub(before));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        font::Codepoint,
        testing::{MockEngine, MockFont, MockGlyph},
    };

    fn script() -> MockFont {
        MockFont::new(vec![
            MockGlyph::new(".notdef"),
            MockGlyph::new("uni3042").codepoint(0x3042),
        ])
    }

    fn latin() -> MockFont {
        MockFont::new(vec![MockGlyph::new(".notdef"), MockGlyph::new("A").codepoint(0x41)])
    }

    #[test]
    fn test_merge_adds_latin_glyphs() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MockEngine::default();
        let mut primary = script();

        merge_fonts(&engine, &mut primary, latin(), dir.path()).unwrap();

        assert_eq!(primary.num_glyphs(), 4);
        assert_eq!(primary.glyphs().len(), primary.num_glyphs());
        assert!(primary.glyph_by_codepoint(Codepoint::new(0x41)).is_some());
        assert!(primary.glyph_by_codepoint(Codepoint::new(0x3042)).is_some());
        // scratch file removed
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MockEngine::failing_merge();
        let mut primary = script();

        let err = merge_fonts(&engine, &mut primary, latin(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert_eq!(primary.num_glyphs(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_primary_wins_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MockEngine::default();
        let mut primary = MockFont::new(vec![MockGlyph::new("A.ja").codepoint(0x41)]);

        merge_fonts(&engine, &mut primary, latin(), dir.path()).unwrap();

        let id = primary.glyph_by_codepoint(Codepoint::new(0x41)).unwrap();
        assert_eq!(primary.glyphs[id.to_usize()].name, "A.ja");
    }
}
