//! Glyph rasterization, caching and string layout
//!
//! Measuring and drawing walk the string with the same layout function, so a
//! drawn string is always exactly as wide as `calculate_string_width` says.

use super::colour::Colour;
use super::surface::{BlendMode, PixelTarget};
use crate::config::FontConfig;
use crate::error::FontError;
use std::collections::HashMap;
use std::path::Path;

pub const ELLIPSIS: char = '\u{2026}';

/// Width of one digit in fixed-width number mode, as a fraction of font size
pub const DIGIT_WIDTH_RATIO: f32 = 0.66;

/// Hand-calibrated proportional widths (fraction of font size)
///
/// Used instead of font metrics for these codepoints outside monospace mode.
const CHARACTER_WIDTHS: &[(char, f32)] = &[
    ('°', 0.25),
    (':', 0.25),
    (' ', 0.3),
    ('+', 0.75),
    ('-', 0.36),
    ('_', 0.47),
    ('&', 0.74),
    ('(', 0.25),
    (')', 0.25),
    ('[', 0.3635),
    (']', 0.3635),
    ('A', 0.78),
    ('B', 0.644),
    ('C', 0.76),
    ('D', 0.8),
    ('E', 0.6),
    ('F', 0.6),
    ('G', 0.8),
    ('H', 0.72),
    ('I', 0.26),
    ('J', 0.48),
    ('K', 0.68),
    ('L', 0.46),
    ('M', 0.98),
    ('N', 0.82),
    ('O', 0.92),
    ('P', 0.6),
    ('Q', 0.9),
    ('R', 0.6),
    ('S', 0.56),
    ('T', 0.64),
    ('U', 0.80),
    ('V', 0.76),
    ('W', 1.14),
    ('X', 0.66),
    ('Y', 0.66),
    ('Z', 0.74),
    ('a', 0.6),
    ('b', 0.66),
    ('c', 0.56),
    ('d', 0.66),
    ('e', 0.6),
    ('f', 0.28),
    ('g', 0.6),
    ('h', 0.6),
    ('i', 0.25),
    ('j', 0.36),
    ('k', 0.56),
    ('l', 0.28),
    ('m', 0.94),
    ('n', 0.582),
    ('o', 0.656),
    ('p', 0.66),
    ('q', 0.68),
    ('r', 0.36),
    ('s', 0.5),
    ('t', 0.37),
    ('u', 0.6),
    ('v', 0.50),
    ('w', 0.87),
    ('x', 0.54),
    ('y', 0.53),
    ('z', 0.5),
];

#[inline]
fn table_width(c: char) -> Option<f32> {
    CHARACTER_WIDTHS
        .iter()
        .find(|(tc, _)| *tc == c)
        .map(|&(_, ratio)| ratio)
}

/// Longest valid UTF-8 prefix; decoding stops at the first bad byte
pub fn valid_utf8_prefix(bytes: &[u8]) -> &str {
    match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Rasterizer output for one codepoint, 8-bit coverage
#[derive(Debug, Clone, Default)]
pub struct RasterGlyph {
    pub width: usize,
    pub height: usize,
    /// Left edge relative to the pen
    pub xmin: i32,
    /// Bottom edge relative to the baseline, positive up
    pub ymin: i32,
    pub advance: f32,
    pub coverage: Vec<u8>,
}

/// A loaded font the cache can rasterize from
pub trait FontFace: Send {
    fn has_glyph(&self, c: char) -> bool;

    /// Font units to pixels for a given pixel height
    fn scale(&self, px: f32) -> f32;

    fn advance(&self, c: char, px: f32) -> f32;

    fn rasterize(&self, c: char, px: f32) -> RasterGlyph;

    fn kern(&self, _left: char, _right: char, _px: f32) -> f32 {
        0.0
    }
}

pub struct FontdueFace {
    font: fontdue::Font,
}

impl FontdueFace {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded font {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }
}

impl FontFace for FontdueFace {
    fn has_glyph(&self, c: char) -> bool {
        self.font.lookup_glyph_index(c) != 0
    }

    fn scale(&self, px: f32) -> f32 {
        self.font.scale_factor(px)
    }

    fn advance(&self, c: char, px: f32) -> f32 {
        self.font.metrics(c, px).advance_width
    }

    fn rasterize(&self, c: char, px: f32) -> RasterGlyph {
        let (metrics, coverage) = self.font.rasterize(c, px);
        RasterGlyph {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
            coverage,
        }
    }

    fn kern(&self, left: char, right: char, px: f32) -> f32 {
        self.font.horizontal_kern(left, right, px).unwrap_or(0.0)
    }
}

/// Which font of the set a glyph came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSlot {
    Default,
    Local,
    Icon,
}

/// Default font (required) plus optional localized and icon fonts
pub struct FontSet {
    default: Box<dyn FontFace>,
    local: Option<Box<dyn FontFace>>,
    icon: Option<Box<dyn FontFace>>,
}

impl FontSet {
    pub fn new(
        default: Option<Box<dyn FontFace>>,
        local: Option<Box<dyn FontFace>>,
        icon: Option<Box<dyn FontFace>>,
    ) -> Result<Self, FontError> {
        let default = default.ok_or(FontError::MissingDefault)?;
        Ok(Self {
            default,
            local,
            icon,
        })
    }

    /// Load every configured font file; only the default one is mandatory
    pub fn from_config(config: &FontConfig) -> Result<Self, FontError> {
        let load = |path: &Option<std::path::PathBuf>| -> Result<Option<Box<dyn FontFace>>, FontError> {
            match path {
                Some(p) => Ok(Some(Box::new(FontdueFace::load(p)?))),
                None => Ok(None),
            }
        };
        Self::new(load(&config.default)?, load(&config.local)?, load(&config.icon)?)
    }

    /// Icon font if it has the codepoint, then default, then local, then default
    pub fn select(&self, c: char) -> FontSlot {
        if self.icon.as_ref().is_some_and(|f| f.has_glyph(c)) {
            FontSlot::Icon
        } else if self.default.has_glyph(c) {
            FontSlot::Default
        } else if self.local.as_ref().is_some_and(|f| f.has_glyph(c)) {
            FontSlot::Local
        } else {
            FontSlot::Default
        }
    }

    pub fn face(&self, slot: FontSlot) -> &dyn FontFace {
        match slot {
            FontSlot::Icon => self.icon.as_deref().unwrap_or(self.default.as_ref()),
            FontSlot::Local => self.local.as_deref().unwrap_or(self.default.as_ref()),
            FontSlot::Default => self.default.as_ref(),
        }
    }
}

/// Cached glyph; immutable once created
#[derive(Debug, Clone)]
pub struct Glyph {
    pub font: FontSlot,
    pub scale: f32,
    /// x0, y0, x1, y1 relative to pen and baseline, y down
    pub bounds: [i32; 4],
    pub x_advance: f32,
    /// 4-bit intensities, row-major
    pub bitmap: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

/// `(codepoint << 32) | (monospace << 31) | size bits`
///
/// Sizes are positive so the f32 sign bit is always free for the monospace flag.
#[inline]
pub fn glyph_key(c: char, monospace: bool, size: f32) -> u64 {
    ((c as u64) << 32) | ((monospace as u64) << 31) | (size.to_bits() & 0x7FFF_FFFF) as u64
}

/// Size and spacing options for one string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub monospace: bool,
    pub fixed_width_numbers: bool,
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            monospace: false,
            fixed_width_numbers: false,
        }
    }

    pub fn monospace(mut self) -> Self {
        self.monospace = true;
        self
    }

    pub fn fixed_width_numbers(mut self) -> Self {
        self.fixed_width_numbers = true;
        self
    }
}

/// Process-lifetime glyph cache; entries are never evicted
pub struct GlyphCache {
    fonts: FontSet,
    glyphs: HashMap<u64, Glyph>,
    width_table: bool,
    rasterized: usize,
}

impl GlyphCache {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts,
            glyphs: HashMap::new(),
            width_table: true,
            rasterized: 0,
        }
    }

    /// Toggle the calibrated proportional width table
    pub fn set_width_table(&mut self, enabled: bool) {
        self.width_table = enabled;
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Number of rasterizations performed so far
    pub fn rasterized_count(&self) -> usize {
        self.rasterized
    }

    pub fn glyph(&mut self, c: char, monospace: bool, size: f32) -> &Glyph {
        let key = glyph_key(c, monospace, size);
        let fonts = &self.fonts;
        let rasterized = &mut self.rasterized;
        self.glyphs.entry(key).or_insert_with(|| {
            *rasterized += 1;
            make_glyph(fonts, c, monospace, size)
        })
    }

    /// Shared walk behind measuring and drawing
    ///
    /// `visit` gets each glyph with its pen position relative to the start.
    /// Returns the widest line and the total height.
    fn layout<F>(&mut self, text: &str, style: TextStyle, mut visit: F) -> (f32, f32)
    where
        F: FnMut(&Glyph, char, f32, f32),
    {
        if style.size <= 0.0 || text.is_empty() {
            return (0.0, 0.0);
        }
        let mut pen_x = 0.0f32;
        let mut pen_y = 0.0f32;
        let mut max_x = 0.0f32;
        let mut prev: Option<char> = None;

        for c in text.chars() {
            if c == '\n' {
                max_x = max_x.max(pen_x);
                pen_x = 0.0;
                pen_y += style.size;
                prev = None;
                continue;
            }

            let fixed_digit = style.fixed_width_numbers && c.is_ascii_digit();
            let table = if self.width_table && !style.monospace && !fixed_digit {
                table_width(c)
            } else {
                None
            };
            let kerning = match prev {
                Some(p) if !style.monospace && !fixed_digit && table.is_none() => {
                    let slot = self.fonts.select(c);
                    self.fonts.face(slot).kern(p, c, style.size)
                }
                _ => 0.0,
            };
            pen_x += kerning;

            let glyph = self.glyph(c, style.monospace, style.size);
            visit(glyph, c, pen_x, pen_y);

            pen_x += if fixed_digit {
                DIGIT_WIDTH_RATIO * style.size
            } else if let Some(ratio) = table {
                ratio * style.size
            } else {
                glyph.x_advance
            };
            prev = Some(c);
        }
        max_x = max_x.max(pen_x);
        (max_x, pen_y + style.size)
    }

    pub fn calculate_string_width(&mut self, text: impl AsRef<[u8]>, style: TextStyle) -> f32 {
        let text = valid_utf8_prefix(text.as_ref());
        self.layout(text, style, |_, _, _, _| {}).0
    }

    /// Draw with `y` as the first line's baseline
    ///
    /// Glyphs starting beyond `max_width` are not blitted but still measured.
    /// A transparent colour only measures. Returns (width, height).
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string(
        &mut self,
        target: &mut PixelTarget,
        text: impl AsRef<[u8]>,
        x: i32,
        y: i32,
        style: TextStyle,
        colour: Colour,
        max_width: Option<f32>,
    ) -> (f32, f32) {
        let text = valid_utf8_prefix(text.as_ref());
        let visible = colour.a() != 0;
        self.layout(text, style, |glyph, c, pen_x, pen_y| {
            if !visible || c.is_whitespace() || glyph.bitmap.is_empty() {
                return;
            }
            if max_width.is_some_and(|limit| pen_x > limit) {
                return;
            }
            let gx = x + pen_x as i32 + glyph.bounds[0];
            let gy = y + pen_y as i32 + glyph.bounds[1];
            blit_glyph(target, glyph, gx, gy, colour);
        })
    }

    /// Draw `text`, colouring every occurrence of any `specials` substring differently
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_with_coloured_sections(
        &mut self,
        target: &mut PixelTarget,
        text: impl AsRef<[u8]>,
        specials: &[&str],
        x: i32,
        y: i32,
        style: TextStyle,
        default_colour: Colour,
        special_colour: Colour,
    ) -> (f32, f32) {
        let text = valid_utf8_prefix(text.as_ref());
        let mut pen = 0.0f32;
        let mut height = 0.0f32;
        let mut rest = text;
        while !rest.is_empty() {
            let next = specials
                .iter()
                .filter(|s| !s.is_empty())
                .filter_map(|s| rest.find(s).map(|at| (at, s.len())))
                .min_by_key(|&(at, _)| at);
            let (plain, special, tail) = match next {
                Some((at, len)) => (&rest[..at], &rest[at..at + len], &rest[at + len..]),
                None => (rest, "", ""),
            };
            for (segment, colour) in [(plain, default_colour), (special, special_colour)] {
                if segment.is_empty() {
                    continue;
                }
                let (w, h) = self.draw_string(target, segment, x + pen as i32, y, style, colour, None);
                pen += w;
                height = height.max(h);
            }
            rest = tail;
        }
        (pen, height)
    }

    /// Cut `text` to fit `limit` pixels, ending in an ellipsis when cut
    pub fn limit_string_length(
        &mut self,
        text: impl AsRef<[u8]>,
        limit: f32,
        style: TextStyle,
    ) -> String {
        let bytes = text.as_ref();
        let text = valid_utf8_prefix(bytes);
        if bytes.len() < 2 || self.calculate_string_width(text, style) <= limit {
            return text.to_string();
        }
        let ellipsis_width = self.calculate_string_width(ELLIPSIS.to_string(), style);
        let mut fitted = 0;
        for (i, c) in text.char_indices() {
            let end = i + c.len_utf8();
            if self.calculate_string_width(&text[..end], style) + ellipsis_width > limit {
                break;
            }
            fitted = end;
        }
        let mut out = text[..fitted].to_string();
        out.push(ELLIPSIS);
        out
    }
}

fn make_glyph(fonts: &FontSet, c: char, monospace: bool, size: f32) -> Glyph {
    let slot = fonts.select(c);
    let face = fonts.face(slot);
    let raster = face.rasterize(c, size);
    let x_advance = if monospace {
        face.advance('W', size)
    } else {
        raster.advance
    };
    let top = -(raster.ymin + raster.height as i32);
    Glyph {
        font: slot,
        scale: face.scale(size),
        bounds: [
            raster.xmin,
            top,
            raster.xmin + raster.width as i32,
            -raster.ymin,
        ],
        x_advance,
        bitmap: raster.coverage.iter().map(|&v| v >> 4).collect(),
        width: raster.width,
        height: raster.height,
    }
}

/// Full intensity is a direct write, partial coverage is write-under
#[inline]
fn blit_glyph(target: &mut PixelTarget, glyph: &Glyph, gx: i32, gy: i32, colour: Colour) {
    for (i, &intensity) in glyph.bitmap.iter().enumerate() {
        if intensity == 0 {
            continue;
        }
        let px = gx + (i % glyph.width) as i32;
        let py = gy + (i / glyph.width) as i32;
        if intensity == 0xF {
            target.put(px, py, colour, BlendMode::Replace);
        } else {
            let alpha = (intensity as u16 * colour.a() as u16 / 0xF) as u8;
            if alpha != 0 {
                target.put(px, py, colour.with_alpha(alpha), BlendMode::Under);
            }
        }
    }
}

/// Blocky stand-in font for tests: every printable ASCII glyph is a filled box
#[cfg(test)]
pub(crate) struct BoxFont {
    pub covers: fn(char) -> bool,
}

#[cfg(test)]
impl FontFace for BoxFont {
    fn has_glyph(&self, c: char) -> bool {
        (self.covers)(c)
    }

    fn scale(&self, px: f32) -> f32 {
        px / 1000.0
    }

    fn advance(&self, c: char, px: f32) -> f32 {
        match c {
            'W' => px * 0.8,
            'i' => px * 0.2,
            _ => px * 0.5,
        }
    }

    fn rasterize(&self, c: char, px: f32) -> RasterGlyph {
        let advance = self.advance(c, px);
        if c.is_whitespace() {
            return RasterGlyph {
                advance,
                ..Default::default()
            };
        }
        let width = (advance as usize).saturating_sub(1).max(1);
        let height = (px * 0.7) as usize;
        let mut coverage = vec![0xFF; width * height];
        for row in coverage.chunks_mut(width) {
            row[0] = 0x80;
        }
        RasterGlyph {
            width,
            height,
            xmin: 0,
            ymin: 0,
            advance,
            coverage,
        }
    }

    fn kern(&self, left: char, right: char, _px: f32) -> f32 {
        if left == 'A' && right == 'V' {
            -2.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
pub(crate) fn test_fonts() -> FontSet {
    let ascii: fn(char) -> bool = |c| c.is_ascii() || c == ELLIPSIS;
    match FontSet::new(Some(Box::new(BoxFont { covers: ascii })), None, None) {
        Ok(set) => set,
        Err(e) => panic!("test font set: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::surface::{PixelLayout, PixelSurface};

    fn cache() -> GlyphCache {
        GlyphCache::new(test_fonts())
    }

    fn surface() -> PixelSurface {
        PixelSurface::new(400, 200, PixelLayout::RowMajor).unwrap()
    }

    const WHITE: Colour = Colour::WHITE;

    #[test]
    fn test_missing_default_font_is_fatal() {
        assert!(matches!(
            FontSet::new(None, None, None),
            Err(FontError::MissingDefault)
        ));
    }

    #[test]
    fn test_font_selection_precedence() {
        let only_x: fn(char) -> bool = |c| c == 'x';
        let only_q: fn(char) -> bool = |c| c == 'q';
        let ascii: fn(char) -> bool = |c| c.is_ascii();
        let set = FontSet::new(
            Some(Box::new(BoxFont { covers: ascii })),
            Some(Box::new(BoxFont { covers: |c| c == 'ж' })),
            Some(Box::new(BoxFont { covers: only_x })),
        )
        .unwrap();
        assert_eq!(set.select('x'), FontSlot::Icon);
        assert_eq!(set.select('a'), FontSlot::Default);
        assert_eq!(set.select('ж'), FontSlot::Local);
        assert_eq!(set.select('語'), FontSlot::Default);

        let no_extras = FontSet::new(Some(Box::new(BoxFont { covers: only_q })), None, None).unwrap();
        assert_eq!(no_extras.select('x'), FontSlot::Default);
    }

    #[test]
    fn test_glyph_key_layout() {
        let key = glyph_key('A', true, 23.0);
        assert_eq!(key >> 32, 'A' as u64);
        assert_eq!((key >> 31) & 1, 1);
        assert_eq!(key & 0x7FFF_FFFF, 23.0f32.to_bits() as u64);
        assert_ne!(glyph_key('A', false, 23.0), key);
        assert_ne!(glyph_key('A', true, 24.0), key);
    }

    #[test]
    fn test_cache_reuses_glyphs() {
        let mut c = cache();
        let mut s = surface();
        let style = TextStyle::new(20.0);
        c.draw_string(&mut s.target(), "hello", 0, 30, style, WHITE, None);
        let after_first = c.rasterized_count();
        assert_eq!(after_first, 4); // h e l o
        c.draw_string(&mut s.target(), "hello", 0, 60, style, WHITE, None);
        c.calculate_string_width("olleh", style);
        assert_eq!(c.rasterized_count(), after_first);
        c.calculate_string_width("hello", style.monospace());
        assert_eq!(c.rasterized_count(), after_first + 4);
    }

    #[test]
    fn test_draw_width_matches_measurement() {
        let mut c = cache();
        let mut s = surface();
        let styles = [
            TextStyle::new(20.0),
            TextStyle::new(23.0).monospace(),
            TextStyle::new(18.0).fixed_width_numbers(),
        ];
        let texts = ["", "AVA", "Wide Wii", "12:45 99%", "line one\nlonger line two", "\u{2026}x"];
        for style in styles {
            for text in texts {
                let measured = c.calculate_string_width(text, style);
                let (drawn, _) = c.draw_string(&mut s.target(), text, 5, 40, style, WHITE, None);
                assert_eq!(drawn, measured, "{:?} {:?}", text, style);
                let (clipped, _) =
                    c.draw_string(&mut s.target(), text, 5, 40, style, WHITE, Some(10.0));
                assert_eq!(clipped, measured);
            }
        }
    }

    #[test]
    fn test_kerning_applies_outside_table() {
        let mut c = cache();
        c.set_width_table(false);
        let style = TextStyle::new(20.0);
        assert_eq!(c.calculate_string_width("AV", style), 18.0);
        assert_eq!(c.calculate_string_width("VA", style), 20.0);
        assert_eq!(c.calculate_string_width("AV", style.monospace()), 32.0);
    }

    #[test]
    fn test_width_table_used_for_known_characters() {
        let mut c = cache();
        let style = TextStyle::new(10.0);
        let w = c.calculate_string_width("Ai", style);
        assert!((w - (0.78 + 0.25) * 10.0).abs() < 1e-4);
        // '#' is not in the table, so the font's advance is used
        assert_eq!(c.calculate_string_width("#", style), 5.0);
    }

    #[test]
    fn test_fixed_width_numbers() {
        let mut c = cache();
        let style = TextStyle::new(20.0).fixed_width_numbers();
        let a = c.calculate_string_width("11:11", style);
        let b = c.calculate_string_width("88:88", style);
        assert_eq!(a, b);
        assert!((c.calculate_string_width("1", style) - 13.2).abs() < 1e-4);
    }

    #[test]
    fn test_newline_measures_widest_line() {
        let mut c = cache();
        let style = TextStyle::new(20.0).monospace();
        let (w, h) = c.draw_string(&mut surface().target(), "ab\nabcd\na", 0, 20, style, WHITE, None);
        assert_eq!(w, 4.0 * 16.0);
        assert_eq!(h, 60.0);
    }

    #[test]
    fn test_malformed_utf8_stops_at_valid_prefix() {
        let mut c = cache();
        let style = TextStyle::new(20.0);
        let good = c.calculate_string_width("ab", style);
        assert_eq!(c.calculate_string_width(b"ab\xFFcd", style), good);
        assert_eq!(c.calculate_string_width(b"ab\xE2\x80", style), good);
        assert_eq!(valid_utf8_prefix(b"\xC3"), "");
    }

    #[test]
    fn test_transparent_colour_only_measures() {
        let mut c = cache();
        let mut s = surface();
        let (w, _) = c.draw_string(&mut s.target(), "abc", 0, 30, TextStyle::new(20.0), Colour::TRANSPARENT, None);
        assert!(w > 0.0);
        assert!(s.back().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_glyph_intensity_blending() {
        let mut c = cache();
        let mut s = surface();
        c.draw_string(&mut s.target(), "#", 0, 20, TextStyle::new(20.0), WHITE, None);
        // 14 rows above the baseline; column 0 is half coverage, the rest full
        assert_eq!(s.get_pixel(1, 10), Some(WHITE));
        let edge = s.get_pixel(0, 10).unwrap();
        assert_eq!(edge.a(), 0x8);
        assert_eq!(s.get_pixel(1, 20), Some(Colour::TRANSPARENT));
    }

    #[test]
    fn test_max_width_stops_blitting() {
        let mut c = cache();
        let mut s = surface();
        let style = TextStyle::new(20.0).monospace();
        c.draw_string(&mut s.target(), "####", 0, 20, style, WHITE, Some(20.0));
        // pens at 0 and 16 are drawn, 32 and 48 are past the limit
        assert!(s.get_pixel(17, 10).unwrap().a() > 0);
        assert_eq!(s.get_pixel(33, 10), Some(Colour::TRANSPARENT));
    }

    #[test]
    fn test_limit_string_length() {
        let mut c = cache();
        let style = TextStyle::new(20.0).monospace();
        // every glyph, ellipsis included, advances 16px
        assert_eq!(c.limit_string_length("abc", 48.0, style), "abc");
        assert_eq!(c.limit_string_length("abcdef", 48.0, style), "ab\u{2026}");
        assert_eq!(c.limit_string_length("abcdef", 10.0, style), "\u{2026}");
        assert_eq!(c.limit_string_length("a", 0.0, style), "a");
        let cut = c.limit_string_length("abcdefgh", 70.0, style);
        assert!(c.calculate_string_width(&cut, style) <= 70.0);
    }

    #[test]
    fn test_coloured_sections() {
        let mut c = cache();
        let mut s = surface();
        let style = TextStyle::new(20.0).monospace();
        let red = Colour::new(0xF, 0, 0, 0xF);
        let (w, _) = c.draw_string_with_coloured_sections(
            &mut s.target(),
            "a*b",
            &["*"],
            0,
            20,
            style,
            WHITE,
            red,
        );
        assert_eq!(w, 48.0);
        assert_eq!(s.get_pixel(5, 10), Some(WHITE));
        assert_eq!(s.get_pixel(21, 10), Some(red));
        assert_eq!(s.get_pixel(37, 10), Some(WHITE));
    }
}
