//! Loader: resolves and opens the two source fonts of a style.

use std::{ffi::OsString, path::PathBuf};

use log::info;

use crate::{
    Error, Result,
    config::FONT_EXTENSION,
    font::{Font, FontEngine},
    glyph_set::GlyphSet,
    pipeline::BuildPaths,
    style::Style,
};

/// Which of the two inputs a font comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Japanese-script source (BIZ UDPGothic).
    Script,
    /// Latin source (Inter).
    Latin,
}

/// Resolve the file of `source` for `style`.
///
/// The script source only ships upright styles; the Latin source uses its
/// SemiBold weights for the bold styles.
pub fn source_path(paths: &BuildPaths, source: Source, style: Style) -> PathBuf {
    let (basename, suffix) = match source {
        Source::Script => (&paths.ja_basename, style.upright().name().to_string()),
        Source::Latin => {
            let semi = if style.is_bold() { "Semi" } else { "" };
            (&paths.en_basename, format!("{semi}{}", style.compact_name()))
        }
    };
    let mut path = OsString::from(basename.as_os_str());
    path.push(format!("-{suffix}.{FONT_EXTENSION}"));
    PathBuf::from(path)
}

/// Open a source font and prepare it for glyph-level work.
///
/// All worth-outputting glyphs have their component references replaced by
/// plain outlines.
pub fn open_source<E: FontEngine>(
    engine: &E,
    paths: &BuildPaths,
    source: Source,
    style: Style,
) -> Result<E::Font> {
    let path = source_path(paths, source, style);
    if !path.exists() {
        return Err(Error::SourceNotFound { path });
    }

    let mut font = engine.open(&path).map_err(Error::engine)?;
    let selection = GlyphSet::worth_outputting(&font);
    font.unlink_references(&selection);

    info!("Opened {} ({} glyphs worth outputting)", path.display(), selection.len());
    Ok(font)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::testing::MockEngine;

    fn paths() -> BuildPaths {
        BuildPaths {
            ja_basename: PathBuf::from("original/BIZUDGothic/BIZUDPGothic"),
            en_basename: PathBuf::from("original/Inter/Inter"),
            ..BuildPaths::default()
        }
    }

    #[test]
    fn test_script_paths() {
        let paths = paths();
        assert_eq!(
            source_path(&paths, Source::Script, Style::Italic),
            Path::new("original/BIZUDGothic/BIZUDPGothic-Regular.ttf")
        );
        assert_eq!(
            source_path(&paths, Source::Script, Style::BoldItalic),
            Path::new("original/BIZUDGothic/BIZUDPGothic-Bold.ttf")
        );
    }

    #[test]
    fn test_latin_paths() {
        let paths = paths();
        assert_eq!(
            source_path(&paths, Source::Latin, Style::Regular),
            Path::new("original/Inter/Inter-Regular.ttf")
        );
        assert_eq!(
            source_path(&paths, Source::Latin, Style::Italic),
            Path::new("original/Inter/Inter-Italic.ttf")
        );
        assert_eq!(
            source_path(&paths, Source::Latin, Style::Bold),
            Path::new("original/Inter/Inter-SemiBold.ttf")
        );
        assert_eq!(
            source_path(&paths, Source::Latin, Style::BoldItalic),
            Path::new("original/Inter/Inter-SemiBoldItalic.ttf")
        );
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let paths = BuildPaths {
            ja_basename: dir.path().join("Missing"),
            ..paths()
        };
        let err = open_source(&MockEngine::default(), &paths, Source::Script, Style::Regular)
            .err()
            .unwrap();
        match err {
            Error::SourceNotFound { path } => {
                assert_eq!(path, dir.path().join("Missing-Regular.ttf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_open_unlinks_worth_outputting() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MockEngine::default();
        let source = dir.path().join("Latin-Regular.ttf");
        engine.register(&source, crate::testing::latin_font());
        let paths = BuildPaths {
            en_basename: dir.path().join("Latin"),
            ..paths()
        };

        let font = open_source(&engine, &paths, Source::Latin, Style::Regular).unwrap();
        assert!(!font.unlinked.is_empty());
        assert!(font.glyphs.iter().all(|g| !g.composite || !g.worth()));
    }
}
