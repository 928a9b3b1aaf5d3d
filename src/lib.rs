//! Tessera: a small software-rendered UI toolkit for overlay menus
//!
//! Everything draws into a 16-bit RGBA4444 surface on the CPU. A `Gui` owns
//! a tree of elements (usually an `OverlayFrame` around a `List`), routes
//! controller and touch input through it, and hands finished frames to a
//! `Display`.

pub mod config;
pub mod error;
pub mod ui;

pub use config::UiConfig;
pub use error::{Error, Result};

/// Set up env_logger; `RUST_LOG` overrides the default `info` filter.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
