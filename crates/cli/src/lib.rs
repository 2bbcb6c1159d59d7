//! Hibizukai Sans CLI library.

pub mod build;
pub mod cli;

pub use build::{build_all, build_one};
