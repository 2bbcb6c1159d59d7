//! Emitter: writes the release binary.

use std::path::{Path, PathBuf};

use log::info;

use crate::{
    Error, Result,
    config::{FONT_EXTENSION, RELEASE_FAMILYNAME},
    font::FontEngine,
    style::Style,
};

/// `{out_dir}/HibizukaiSans-{compact style}.ttf`.
pub fn release_path(out_dir: &Path, style: Style) -> PathBuf {
    out_dir.join(format!("{RELEASE_FAMILYNAME}-{}.{FONT_EXTENSION}", style.compact_name()))
}

/// Serialize `font` for `style` into `out_dir`. Not retried on failure.
pub fn emit<E: FontEngine>(
    engine: &E,
    font: &E::Font,
    out_dir: &Path,
    style: Style,
) -> Result<PathBuf> {
    let path = release_path(out_dir, style);
    engine.generate(font, &path).map_err(|e| Error::Serialization {
        path: path.clone(),
        source: e.into(),
    })?;
    info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockEngine, MockFont, MockGlyph};

    #[test]
    fn test_release_path() {
        let out = Path::new("HibizukaiSans");
        assert_eq!(release_path(out, Style::Regular), out.join("HibizukaiSans-Regular.ttf"));
        assert_eq!(
            release_path(out, Style::BoldItalic),
            out.join("HibizukaiSans-BoldItalic.ttf")
        );
    }

    #[test]
    fn test_generate_failure_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MockEngine::failing_generate();
        let font = MockFont::new(vec![MockGlyph::new(".notdef")]);

        let err = emit(&engine, &font, dir.path(), Style::Bold).unwrap_err();
        match err {
            Error::Serialization { path, .. } => {
                assert_eq!(path, dir.path().join("HibizukaiSans-Bold.ttf"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("HibizukaiSans-Bold.ttf").exists());
    }
}
