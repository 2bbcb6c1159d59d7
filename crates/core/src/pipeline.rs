//! Per-style build driver.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use log::info;

use crate::{
    Error, Result,
    config::{BUILD_DIR, EM_METRICS, EN_FONT_BASENAME, ITALIC_ANGLE, JA_FONT_BASENAME},
    dedup::clear_duplicate_glyphs,
    emit::emit,
    font::FontEngine,
    load::{Source, open_source},
    lookups::remove_lookups,
    merge::merge_fonts,
    metadata::apply_release_metadata,
    metrics::scale_em,
    slant::italicize,
    style::Style,
    tnum::enable_tnum,
};

/// Filesystem locations used by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Basename of the script source files, without `-{style}.ttf`.
    pub ja_basename: PathBuf,
    /// Basename of the Latin source files.
    pub en_basename: PathBuf,
    pub output_dir: PathBuf,
    /// Directory for the merge scratch file.
    pub scratch_dir: PathBuf,
}

impl Default for BuildPaths {
    fn default() -> Self {
        Self {
            ja_basename: PathBuf::from(JA_FONT_BASENAME),
            en_basename: PathBuf::from(EN_FONT_BASENAME),
            output_dir: PathBuf::from(BUILD_DIR),
            scratch_dir: PathBuf::from(BUILD_DIR),
        }
    }
}

/// Create `dir` and its parents if they do not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::Io { path: dir.to_path_buf(), source })
}

fn run_stage<T>(name: &str, style: Style, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let out = f()?;
    info!("[{style}] {name} ({:.2}s)", start.elapsed().as_secs_f64());
    Ok(out)
}

/// Build the release font of one style and return the path written.
pub fn build_style<E: FontEngine>(
    engine: &E,
    paths: &BuildPaths,
    style: Style,
    version: &str,
) -> Result<PathBuf> {
    let start = Instant::now();
    ensure_dir(&paths.output_dir)?;
    ensure_dir(&paths.scratch_dir)?;

    let (mut script, mut latin) = run_stage("load", style, || {
        Ok((
            open_source(engine, paths, Source::Script, style)?,
            open_source(engine, paths, Source::Latin, style)?,
        ))
    })?;

    run_stage("normalize metrics", style, || {
        scale_em(&mut script, EM_METRICS);
        scale_em(&mut latin, EM_METRICS);
        Ok(())
    })?;

    run_stage("enable tnum", style, || {
        let projected = enable_tnum(&mut latin);
        info!("[{style}] {projected} glyphs now use tabular figures");
        Ok(())
    })?;

    run_stage("prune lookups", style, || {
        remove_lookups(&mut script, true, false);
        Ok(())
    })?;

    run_stage("deduplicate", style, || {
        clear_duplicate_glyphs(&mut script, &latin);
        Ok(())
    })?;

    if style.is_italic() {
        run_stage("slant", style, || {
            italicize(&mut script, ITALIC_ANGLE);
            Ok(())
        })?;
    }

    run_stage("merge", style, || merge_fonts(engine, &mut script, latin, &paths.scratch_dir))?;

    run_stage("metadata", style, || apply_release_metadata(&mut script, style, version))?;

    let output = run_stage("emit", style, || emit(engine, &script, &paths.output_dir, style))?;

    info!("[{style}] done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(output)
}
