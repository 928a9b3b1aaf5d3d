// Theme colours
// All colours are RGBA4444 (see `Colour`); the constants below are the
// compiled-in defaults and a theme file can override any of them by name.

use super::colour::Colour;
use crate::error::ThemeError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

// Surfaces
pub const DEFAULT_BACKGROUND: Colour = Colour::new(0x0, 0x0, 0x0, 0xD);
pub const TABLE_BACKGROUND: Colour = Colour::new(0x2, 0x2, 0x2, 0xF);
pub const FOCUS_BACKGROUND: Colour = Colour::new(0x0, 0x6, 0xB, 0x4);
pub const CLICK: Colour = Colour::new(0x0, 0x2, 0x4, 0xF);

// Focus highlight, pulsing between 1 and 2; 3/4 are the shake/click variants
pub const HIGHLIGHT_1: Colour = Colour::new(0x2, 0x8, 0x8, 0xF);
pub const HIGHLIGHT_2: Colour = Colour::new(0x8, 0x8, 0xF, 0xF);
pub const HIGHLIGHT_3: Colour = Colour::new(0xF, 0x3, 0x3, 0xF);
pub const HIGHLIGHT_4: Colour = Colour::new(0xF, 0xA, 0x0, 0xF);

// Lines
pub const SEPARATOR: Colour = Colour::new(0x3, 0x3, 0x3, 0xF);
pub const HEADER_BAR: Colour = Colour::new(0x5, 0x5, 0x5, 0xF);
pub const SCROLLBAR: Colour = Colour::new(0x5, 0x5, 0x5, 0xF);
pub const SCROLLBAR_WALL: Colour = Colour::new(0x2, 0x2, 0x2, 0xF);

// Text
pub const TEXT: Colour = Colour::new(0xF, 0xF, 0xF, 0xF);
pub const SELECTED_TEXT: Colour = Colour::new(0x9, 0xF, 0xF, 0xF);
pub const HEADER_TEXT: Colour = Colour::new(0xA, 0xA, 0xA, 0xF);
pub const ON_TEXT: Colour = Colour::new(0x0, 0xF, 0xD, 0xF);
pub const OFF_TEXT: Colour = Colour::new(0x8, 0x8, 0x8, 0xF);
pub const TABLE_LABEL: Colour = Colour::new(0xC, 0xC, 0xC, 0xF);
pub const TABLE_VALUE: Colour = Colour::new(0x9, 0xF, 0xF, 0xF);
pub const STAR: Colour = Colour::new(0xF, 0xD, 0x0, 0xF);

// Track bars
pub const TRACK_BAR: Colour = Colour::new(0x0, 0xC, 0xF, 0xF);
pub const TRACK_BAR_EMPTY: Colour = Colour::new(0x4, 0x4, 0x4, 0xF);
pub const TRACK_BAR_KNOB: Colour = Colour::new(0xE, 0xE, 0xE, 0xF);

macro_rules! theme_colours {
    ($($field:ident => $default:ident),* $(,)?) => {
        /// Resolved colour table handed to every draw call through the renderer
        #[derive(Debug, Clone, PartialEq)]
        pub struct Theme {
            $(pub $field: Colour,)*
        }

        impl Default for Theme {
            fn default() -> Self {
                Self {
                    $($field: $default,)*
                }
            }
        }

        impl Theme {
            /// Symbolic lookup, e.g. `"highlight_1"`
            pub fn get(&self, name: &str) -> Option<Colour> {
                match name {
                    $(stringify!($field) => Some(self.$field),)*
                    _ => None,
                }
            }

            /// Returns false for unknown names
            pub fn set(&mut self, name: &str, colour: Colour) -> bool {
                match name {
                    $(stringify!($field) => {
                        self.$field = colour;
                        true
                    })*
                    _ => false,
                }
            }

            pub fn names() -> &'static [&'static str] {
                &[$(stringify!($field),)*]
            }
        }
    };
}

theme_colours! {
    default_background => DEFAULT_BACKGROUND,
    table_background => TABLE_BACKGROUND,
    focus_background => FOCUS_BACKGROUND,
    click => CLICK,
    highlight_1 => HIGHLIGHT_1,
    highlight_2 => HIGHLIGHT_2,
    highlight_3 => HIGHLIGHT_3,
    highlight_4 => HIGHLIGHT_4,
    separator => SEPARATOR,
    header_bar => HEADER_BAR,
    scrollbar => SCROLLBAR,
    scrollbar_wall => SCROLLBAR_WALL,
    text => TEXT,
    selected_text => SELECTED_TEXT,
    header_text => HEADER_TEXT,
    on_text => ON_TEXT,
    off_text => OFF_TEXT,
    table_label => TABLE_LABEL,
    table_value => TABLE_VALUE,
    star => STAR,
    track_bar => TRACK_BAR,
    track_bar_empty => TRACK_BAR_EMPTY,
    track_bar_knob => TRACK_BAR_KNOB,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    colours: BTreeMap<String, String>,
}

impl Theme {
    /// Defaults overridden by the `[colours]` table of a TOML document
    pub fn from_toml_str(data: &str) -> Result<Self, ThemeError> {
        let file: ThemeFile = toml::from_str(data)?;
        let mut theme = Theme::default();
        for (name, value) in &file.colours {
            let colour = Colour::parse_hex(value).ok_or_else(|| ThemeError::InvalidColour {
                name: name.clone(),
                value: value.clone(),
            })?;
            if !theme.set(name, colour) {
                log::warn!("theme: unknown colour name '{}' ignored", name);
            }
        }
        Ok(theme)
    }

    pub fn load(path: &Path) -> Result<Self, ThemeError> {
        let data = std::fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let theme = Self::from_toml_str(&data)?;
        log::info!("theme: loaded from {}", path.display());
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_theme_is_default() {
        assert_eq!(Theme::from_toml_str("").unwrap(), Theme::default());
    }

    #[test]
    fn test_partial_theme_overrides_named_colours() {
        let theme = Theme::from_toml_str(
            r##"
[colours]
highlight_1 = "#F00F"
separator = "#102030"
"##,
        )
        .unwrap();
        assert_eq!(theme.highlight_1, Colour::new(0xF, 0, 0, 0xF));
        assert_eq!(theme.separator, Colour::new(0x1, 0x2, 0x3, 0xF));
        assert_eq!(theme.highlight_2, HIGHLIGHT_2);
    }

    #[test]
    fn test_invalid_colour_is_an_error() {
        let err = Theme::from_toml_str("[colours]\ntext = \"blue\"").unwrap_err();
        assert!(matches!(err, ThemeError::InvalidColour { .. }));
    }

    #[test]
    fn test_unknown_name_is_ignored() {
        let theme = Theme::from_toml_str("[colours]\nnot_a_colour = \"#FFF\"").unwrap();
        assert_eq!(theme, Theme::default());
    }

    #[test]
    fn test_symbolic_lookup() {
        let theme = Theme::default();
        assert_eq!(theme.get("highlight_3"), Some(HIGHLIGHT_3));
        assert_eq!(theme.get("nope"), None);
        assert!(Theme::names().contains(&"track_bar"));
    }

    #[test]
    fn test_missing_theme_file() {
        let path = std::env::temp_dir().join("tessera-theme-that-does-not-exist.toml");
        assert!(matches!(Theme::load(&path), Err(ThemeError::Io { .. })));
    }
}
