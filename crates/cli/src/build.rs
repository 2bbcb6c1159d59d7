//! Style builds driven by the TrueType engine.

use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use hibizukai_core::{BuildPaths, Style, build_style};
use hibizukai_font_engine::TrueTypeEngine;
use log::info;
use rayon::prelude::*;

/// Build one style and return the path of the release font.
pub fn build_one(paths: &BuildPaths, style: Style, version: &str) -> Result<PathBuf> {
    build_style(&TrueTypeEngine, paths, style, version)
        .with_context(|| format!("Failed to build {style}"))
}

/// Build every style in parallel. Each style opens its own fonts; only the
/// output and scratch directories are shared.
pub fn build_all(paths: &BuildPaths, version: &str) -> Result<Vec<PathBuf>> {
    let start = Instant::now();
    let outputs = Style::ALL
        .par_iter()
        .map(|&style| build_one(paths, style, version))
        .collect::<Result<Vec<_>>>()?;

    for output in &outputs {
        info!("Created {}", output.display());
    }
    info!("Built {} styles in {:.2}s", outputs.len(), start.elapsed().as_secs_f64());
    Ok(outputs)
}
