//! 4-bit-per-channel colour
//!
//! Packed as `r | g << 4 | b << 8 | a << 12` so one pixel is one u16.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colour(pub u16);

impl Colour {
    pub const TRANSPARENT: Colour = Colour::new(0, 0, 0, 0);
    pub const BLACK: Colour = Colour::new(0, 0, 0, 0xF);
    pub const WHITE: Colour = Colour::new(0xF, 0xF, 0xF, 0xF);

    /// Build from nibbles; anything above 0xF is masked
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Colour(
            (r as u16 & 0xF)
                | ((g as u16 & 0xF) << 4)
                | ((b as u16 & 0xF) << 8)
                | ((a as u16 & 0xF) << 12),
        )
    }

    /// Reduce an 8-bit channel colour by dropping the low nibble
    #[inline]
    pub const fn from_rgba8888(r: u8, g: u8, b: u8, a: u8) -> Self {
        Colour::new(r >> 4, g >> 4, b >> 4, a >> 4)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 & 0xF) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        ((self.0 >> 4) & 0xF) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }

    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Colour((self.0 & 0x0FFF) | ((a as u16 & 0xF) << 12))
    }

    /// Expand to 0xAARRGGBB by replicating each nibble (0xF -> 0xFF)
    #[inline]
    pub const fn to_argb8888(self) -> u32 {
        let r = self.r() as u32 * 0x11;
        let g = self.g() as u32 * 0x11;
        let b = self.b() as u32 * 0x11;
        let a = self.a() as u32 * 0x11;
        (a << 24) | (r << 16) | (g << 8) | b
    }

    /// Linear mix of two colours, `t` in [0,1], all four channels
    pub fn lerp(self, other: Colour, t: f32) -> Colour {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Colour::new(
            mix(self.r(), other.r()),
            mix(self.g(), other.g()),
            mix(self.b(), other.b()),
            mix(self.a(), other.a()),
        )
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    ///
    /// Short forms are taken as nibbles directly, long forms are reduced with `>> 4`.
    /// Missing alpha means opaque.
    pub fn parse_hex(s: &str) -> Option<Colour> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Colour::new(nibble(0)?, nibble(1)?, nibble(2)?, 0xF)),
            4 => Some(Colour::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Some(Colour::from_rgba8888(byte(0)?, byte(2)?, byte(4)?, 0xFF)),
            8 => Some(Colour::from_rgba8888(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl From<u16> for Colour {
    fn from(raw: u16) -> Self {
        Colour(raw)
    }
}
