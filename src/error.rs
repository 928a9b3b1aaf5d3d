//! Error types for the toolkit
//!
//! Per-pixel failures never reach these: out-of-bounds and scissor-rejected
//! writes are dropped silently. These cover startup and file loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("default font is required but none was supplied")]
    MissingDefault,

    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font data: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface size {width}x{height} is empty")]
    Empty { width: usize, height: usize },

    #[error("tiled layout needs width multiple of 32 and height multiple of 128, got {width}x{height}")]
    UnalignedTiledSize { width: usize, height: usize },
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("failed to read theme file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse theme: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid colour for '{name}': {value}")]
    InvalidColour { name: String, value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display size mismatch: surface is {surface_width}x{surface_height}, target is {target_width}x{target_height}")]
    SizeMismatch {
        surface_width: usize,
        surface_height: usize,
        target_width: usize,
        target_height: usize,
    },

    #[error("presentation failed: {0}")]
    Present(String),
}

/// Crate-level error covering every fallible startup path
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

pub type Result<T> = std::result::Result<T, Error>;
