use std::{io, path::PathBuf, result};

use read_fonts::ReadError;
use thiserror::Error;
use write_fonts::BuilderError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to read font: {0}")]
    Read(#[from] ReadError),

    #[error("failed to build font: {0}")]
    Build(#[from] BuilderError),

    #[error("failed to write glyph data: {0}")]
    Write(#[from] write_fonts::error::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("font has {0} glyphs, more than a TrueType font can hold")]
    TooManyGlyphs(usize),

    #[error("only TrueType (glyf) fonts are supported")]
    NotTrueType,
}

pub type Result<T> = result::Result<T, EngineError>;
