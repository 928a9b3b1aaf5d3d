//! Per-channel alpha compositing in 4-bit space
//!
//! Two directions:
//! - write-over: mix channels by the new colour's alpha, keep the existing alpha
//! - write-under: mix channels the same way, accumulate alpha so partial
//!   coverage (glyph edges) still adds visible alpha

use super::colour::Colour;

/// Weighted mix of one 4-bit channel
///
/// `alpha = 0` returns `dst`, `alpha = 15` returns `src`, rounded down between.
#[inline]
pub const fn blend(dst: u8, src: u8, alpha: u8) -> u8 {
    let alpha = (if alpha > 0xF { 0xF } else { alpha }) as u16;
    ((src as u16 * alpha + dst as u16 * (0xF - alpha)) / 0xF) as u8
}

#[inline]
fn mix_rgb(existing: Colour, new: Colour) -> (u8, u8, u8) {
    let a = new.a();
    (
        blend(existing.r(), new.r(), a),
        blend(existing.g(), new.g(), a),
        blend(existing.b(), new.b(), a),
    )
}

/// Composite keeping the destination's alpha
#[inline]
pub fn write_over(existing: Colour, new: Colour) -> Colour {
    let (r, g, b) = mix_rgb(existing, new);
    Colour::new(r, g, b, existing.a())
}

/// Composite accumulating alpha: `new_a + old_a * (15 - new_a) / 15`
#[inline]
pub fn write_under(existing: Colour, new: Colour) -> Colour {
    let (r, g, b) = mix_rgb(existing, new);
    let na = new.a() as u16;
    let oa = existing.a() as u16;
    let a = na + oa * (0xF - na) / 0xF;
    Colour::new(r, g, b, a as u8)
}

/// Global fade applied to every colour before blending
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opacity {
    factor: f32,
    capture_mode: bool,
}

impl Default for Opacity {
    fn default() -> Self {
        Self {
            factor: 1.0,
            capture_mode: false,
        }
    }
}

impl Opacity {
    pub fn new(factor: f32, capture_mode: bool) -> Self {
        let mut o = Self {
            factor: 1.0,
            capture_mode,
        };
        o.set(factor);
        o
    }

    /// Clamped to [0,1]; NaN counts as fully transparent
    pub fn set(&mut self, factor: f32) {
        self.factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn set_capture_mode(&mut self, enabled: bool) {
        self.capture_mode = enabled;
    }

    pub fn capture_mode(&self) -> bool {
        self.capture_mode
    }

    /// Scale the colour's alpha; capture mode renders everything opaque
    #[inline]
    pub fn apply(&self, c: Colour) -> Colour {
        if self.capture_mode {
            return c.with_alpha(0xF);
        }
        let cap = (0xF as f32 * self.factor) as u8;
        c.with_alpha(c.a().min(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_endpoints_every_channel_value() {
        for dst in 0..=0xF {
            for src in 0..=0xF {
                assert_eq!(blend(dst, src, 0), dst);
                assert_eq!(blend(dst, src, 0xF), src);
            }
        }
    }

    #[test]
    fn test_blend_stays_in_range() {
        for dst in 0..=0xF {
            for src in 0..=0xF {
                for a in 0..=0xF {
                    let v = blend(dst, src, a);
                    assert!(v <= 0xF);
                    assert!(v >= dst.min(src) && v <= dst.max(src));
                }
            }
        }
    }

    #[test]
    fn test_write_over_keeps_existing_alpha() {
        let existing = Colour::new(0, 0, 0, 0x3);
        let new = Colour::new(0xF, 0xF, 0xF, 0xF);
        let out = write_over(existing, new);
        assert_eq!(out, Colour::new(0xF, 0xF, 0xF, 0x3));
    }

    #[test]
    fn test_write_under_accumulates_alpha() {
        let existing = Colour::new(0, 0, 0, 0);
        let out = write_under(existing, Colour::new(0xF, 0, 0, 0x5));
        assert_eq!(out.a(), 0x5);

        let existing = Colour::new(0, 0, 0, 0xF);
        let out = write_under(existing, Colour::new(0xF, 0, 0, 0x5));
        assert_eq!(out.a(), 0xF);

        // 6 + 10 * 9 / 15 = 12
        let out = write_under(Colour::new(0, 0, 0, 0xA), Colour::new(0, 0, 0, 0x6));
        assert_eq!(out.a(), 12);
    }

    #[test]
    fn test_opacity_clamps_and_scales() {
        let mut o = Opacity::default();
        o.set(2.0);
        assert_eq!(o.factor(), 1.0);
        o.set(-1.0);
        assert_eq!(o.factor(), 0.0);
        o.set(0.5);
        assert_eq!(o.apply(Colour::WHITE).a(), 7);
        assert_eq!(o.apply(Colour::new(1, 1, 1, 3)).a(), 3);
    }

    #[test]
    fn test_capture_mode_forces_opaque() {
        let o = Opacity::new(0.0, true);
        assert_eq!(o.apply(Colour::new(1, 2, 3, 0)).a(), 0xF);
    }
}
