use std::path::Path;

use hibizukai_core::FontEngine;
use log::info;

use crate::{EngineError, font::TtFont, io::FontFile};

/// Reads and writes TrueType (`glyf`) fonts. The interchange format used
/// for merging is TrueType as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrueTypeEngine;

impl FontEngine for TrueTypeEngine {
    type Font = TtFont;
    type Error = EngineError;

    const INTERCHANGE_EXTENSION: &'static str = "ttf";

    fn open(&self, path: &Path) -> Result<TtFont, EngineError> {
        let data = FontFile::new(path).read()?;
        let font = TtFont::from_bytes(&data)?;
        info!("Opened {} ({} glyphs)", path.display(), font.glyphs.len());
        Ok(font)
    }

    fn save(&self, font: &TtFont, path: &Path) -> Result<(), EngineError> {
        FontFile::new(path).write(font.to_bytes()?)
    }

    fn merge_from(&self, primary: &mut TtFont, path: &Path) -> Result<(), EngineError> {
        let secondary = TtFont::from_bytes(&FontFile::new(path).read()?)?;
        primary.merge(secondary)
    }

    fn generate(&self, font: &TtFont, path: &Path) -> Result<(), EngineError> {
        let data = font.to_bytes()?;
        FontFile::new(path).write(&data)?;
        info!(
            "Generated {} ({:.2} MB)",
            path.display(),
            data.len() as f64 / 1_048_576.0
        );
        Ok(())
    }
}
