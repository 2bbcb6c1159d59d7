//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hibizukai_core::{
    BuildPaths, Style,
    config::{BUILD_DIR, EN_FONT_BASENAME, JA_FONT_BASENAME},
};
use log::info;

use crate::build::{build_all, build_one};

#[derive(Parser)]
#[command(name = "hibizukai-sans")]
#[command(about = "Build Hibizukai Sans from BIZ UDPGothic and Inter sources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Output directory for the release fonts.
    #[arg(long, default_value = BUILD_DIR)]
    pub build_dir: PathBuf,
    /// Basename of the BIZ UDPGothic sources, without `-{style}.ttf`.
    #[arg(long, default_value = JA_FONT_BASENAME)]
    pub ja_basename: PathBuf,
    /// Basename of the Inter sources, without `-{style}.ttf`.
    #[arg(long, default_value = EN_FONT_BASENAME)]
    pub en_basename: PathBuf,
    /// Directory for merge scratch files. Defaults to the build directory.
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
}

impl BuildArgs {
    pub fn paths(&self) -> BuildPaths {
        BuildPaths {
            ja_basename: self.ja_basename.clone(),
            en_basename: self.en_basename.clone(),
            output_dir: self.build_dir.clone(),
            scratch_dir: self.scratch_dir.clone().unwrap_or_else(|| self.build_dir.clone()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a single style.
    Build {
        /// One of regular, bold, italic, bold-italic.
        style: Style,
        version: String,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Build all four styles in parallel.
    BuildAll {
        version: String,
        #[command(flatten)]
        args: BuildArgs,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Build { style, version, args } => {
                let output = build_one(&args.paths(), style, &version)?;
                info!("Created {}", output.display());
            }
            Commands::BuildAll { version, args } => {
                build_all(&args.paths(), &version)?;
            }
        }
        Ok(())
    }
}
