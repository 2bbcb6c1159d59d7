//! Error types for the composition pipeline.

use std::{error, io, path::PathBuf, result};

use thiserror::Error;

use crate::font::Codepoint;

/// Type-erased error reported by a font engine.
pub type BoxError = Box<dyn error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source font not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("could not allocate a temporary file in {} after {retries} attempts", dir.display())]
    TempFileAllocation { dir: PathBuf, retries: usize },

    #[error("failed to write font {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("reference glyph {codepoint} is missing from the merged font")]
    MissingReferenceGlyph { codepoint: Codepoint },

    #[error("font engine error: {0}")]
    Engine(#[source] BoxError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn engine(err: impl Into<BoxError>) -> Self {
        Error::Engine(err.into())
    }
}

pub type Result<T> = result::Result<T, Error>;
