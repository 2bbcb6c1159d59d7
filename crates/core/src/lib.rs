//! Hibizukai Core - composition pipeline for the Hibizukai Sans hybrid font.
//!
//! A Japanese-script source and a Latin source are normalized to a shared em
//! grid, deduplicated by codepoint, optionally slanted, merged and annotated
//! with release metadata. Font parsing and serialization live behind the
//! [`FontEngine`] and [`Font`] traits.

pub mod config;
pub mod dedup;
pub mod emit;
pub mod error;
pub mod font;
pub mod glyph_set;
pub mod load;
pub mod lookups;
pub mod merge;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod slant;
pub mod style;
pub mod temp;
pub mod tnum;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use font::{
    Codepoint, EmMetrics, Font, FontEngine, FontInfo, GlyphId, GlyphRef, HheaInfo, Locale,
    LookupId, LookupKind, NameEntry, NameId, Os2Info, PosSubEntry, PosSubKind, TransformOptions,
};
pub use glyph_set::GlyphSet;
pub use pipeline::{BuildPaths, build_style};
pub use style::Style;
