//! Hibizukai Font Engine - TrueType backend for the composition pipeline.
//!
//! [`TrueTypeEngine`] implements [`hibizukai_core::FontEngine`] on top of
//! `read-fonts` and `write-fonts`. Outlines are decoded into editable
//! [`TtFont`] glyph records; layout tables are carried through byte for byte
//! while they stay valid and recompiled once lookups, scale or glyph ids
//! change.

mod cmap;
mod engine;
mod error;
mod font;
mod gsub;
mod io;
mod layout;
mod merge;
mod outline;
mod read;
mod write;

pub use engine::TrueTypeEngine;
pub use error::{EngineError, Result};
pub use font::{GlyphRecord, LayoutTables, TtFont};
pub use io::FontFile;
pub use outline::{Component, Outline, OutlineContour, OutlinePoint};
