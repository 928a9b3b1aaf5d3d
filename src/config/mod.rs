//! Toolkit configuration, read from TOML
//!
//! Every section has defaults, so an empty or partial file is valid.

use crate::error::ConfigError;
use crate::ui::surface::PixelLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub surface: SurfaceConfig,
    pub fonts: FontConfig,
    pub render: RenderConfig,
    /// Optional theme file overriding the compiled-in colours
    pub theme: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 448,
            height: 720,
            layout: PixelLayout::RowMajor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Required at startup
    pub default: Option<PathBuf>,
    pub local: Option<PathBuf>,
    pub icon: Option<PathBuf>,
    /// Body text size in pixels
    pub size: f32,
    /// Use the calibrated proportional width table for common characters
    pub width_table: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            default: None,
            local: None,
            icon: None,
            size: 23.0,
            width_table: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Allow the threaded fill for large rounded rects
    pub multithreaded: bool,
    pub max_workers: usize,
    /// Frame pacing for displays without their own vsync
    pub frame_interval_ms: u64,
    /// Render everything opaque (screenshots / capture)
    pub capture_mode: bool,
    pub opacity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            multithreaded: true,
            max_workers: 4,
            frame_interval_ms: 16,
            capture_mode: false,
            opacity: 1.0,
        }
    }
}

/// Platform config directory for the toolkit
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tessera")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl UiConfig {
    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }

    /// Missing file means defaults; unreadable or malformed is an error
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("config: {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let cfg = Self::from_toml_str(&data)?;
        log::info!("config: loaded from {}", path.display());
        Ok(cfg)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }
}

#[cfg(test)]
mod tests;
