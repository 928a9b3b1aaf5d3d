//! Double-buffered off-screen pixel surface
//!
//! Pixels are `Colour` (RGBA4444) stored as u16. Drawing always targets the back
//! buffer; `swap_buffers` hands it to the display as the front buffer.
//! Every write goes through `Addressing::offset`, which rejects anything outside
//! the surface or the active scissor region.

use super::colour::Colour;
use super::compositing::{write_over, write_under};
use crate::error::SurfaceError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Rows per band for the row-major layout when splitting work across threads
pub const ROW_CHUNK: usize = 8;

/// Rows per band in the tiled layout (one band = one contiguous block row)
pub const TILE_BAND_ROWS: usize = 128;

/// Coordinate to memory mapping of the backing buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    /// Block-linear layout used by the original handheld framebuffer:
    /// 32x16 pixel blocks with interleaved x/y bits, stacked into 128-row bands
    Tiled,
    /// Plain `y * width + x`
    #[default]
    RowMajor,
}

impl PixelLayout {
    /// Offset of an in-bounds pixel. Callers validate bounds first.
    #[inline]
    pub fn offset(self, x: usize, y: usize, width: usize) -> usize {
        match self {
            PixelLayout::Tiled => tiled_offset(x, y, width),
            PixelLayout::RowMajor => y * width + x,
        }
    }

    /// Height of one contiguous band of rows
    #[inline]
    pub fn band_rows(self) -> usize {
        match self {
            PixelLayout::Tiled => TILE_BAND_ROWS,
            PixelLayout::RowMajor => ROW_CHUNK,
        }
    }

    pub fn validate(self, width: usize, height: usize) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Empty { width, height });
        }
        if self == PixelLayout::Tiled && (width % 32 != 0 || height % TILE_BAND_ROWS != 0) {
            return Err(SurfaceError::UnalignedTiledSize { width, height });
        }
        Ok(())
    }
}

/// Block-linear offset, computed in bytes at 2 bytes per pixel and halved
#[inline]
fn tiled_offset(x: usize, y: usize, width: usize) -> usize {
    let block = ((y & 127) / 16 + x / 32 * 8 + (y / 128) * (width / 2 / 16 * 8)) * 1024;
    let inner = ((y % 16) / 8) * 512
        + ((x % 32) / 16) * 256
        + ((y % 8) / 2) * 64
        + ((x % 16) / 8) * 32
        + (y % 2) * 16
        + (x % 8) * 2;
    (block + inner) / 2
}

/// Active clip rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRegion {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl ScissorRegion {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.x as i64
            && y >= self.y as i64
            && x < self.x as i64 + self.w as i64
            && y < self.y as i64 + self.h as i64
    }
}

/// How a colour lands on the existing pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Direct store
    Replace,
    /// Mix channels, keep existing alpha
    Over,
    /// Mix channels, accumulate alpha
    Under,
}

/// Everything needed to address and clip a pixel, small enough to copy into workers
#[derive(Debug, Clone, Copy)]
pub struct Addressing {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub clip: Option<ScissorRegion>,
}

impl Addressing {
    /// `None` means rejected: outside the surface or outside the active scissor
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (xu, yu) = (x as usize, y as usize);
        if xu >= self.width || yu >= self.height {
            return None;
        }
        if let Some(clip) = self.clip {
            if !clip.contains(x, y) {
                return None;
            }
        }
        Some(self.layout.offset(xu, yu, self.width))
    }
}

/// Writable window onto a contiguous range of the back buffer
///
/// Either the whole buffer or one band of rows. A band owns its slice
/// exclusively, so several bands can be filled on different threads.
pub struct PixelTarget<'a> {
    pixels: &'a mut [u16],
    base: usize,
    rows: Range<usize>,
    addr: Addressing,
}

impl<'a> PixelTarget<'a> {
    /// Rows this target can reach
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    pub fn addressing(&self) -> &Addressing {
        &self.addr
    }

    #[inline]
    pub fn put(&mut self, x: i32, y: i32, colour: Colour, mode: BlendMode) {
        let Some(offset) = self.addr.offset(x, y) else {
            return;
        };
        let Some(slot) = offset
            .checked_sub(self.base)
            .and_then(|i| self.pixels.get_mut(i))
        else {
            return;
        };
        let existing = Colour(*slot);
        *slot = match mode {
            BlendMode::Replace => colour,
            BlendMode::Over => write_over(existing, colour),
            BlendMode::Under => write_under(existing, colour),
        }
        .0;
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Colour> {
        let offset = self.addr.offset(x, y)?;
        let i = offset.checked_sub(self.base)?;
        self.pixels.get(i).map(|&p| Colour(p))
    }
}

pub struct PixelSurface {
    width: usize,
    height: usize,
    layout: PixelLayout,
    front: Vec<u16>,
    back: Vec<u16>,
    scissors: Vec<ScissorRegion>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize, layout: PixelLayout) -> Result<Self, SurfaceError> {
        layout.validate(width, height)?;
        let len = width * height;
        log::debug!("pixel surface {}x{} ({:?})", width, height, layout);
        Ok(Self {
            width,
            height,
            layout,
            front: vec![0; len],
            back: vec![0; len],
            scissors: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Push a clip region; only the innermost one is active
    pub fn enable_scissoring(&mut self, x: i32, y: i32, w: u32, h: u32) {
        self.scissors.push(ScissorRegion::new(x, y, w, h));
    }

    /// Pop the innermost clip region
    pub fn disable_scissoring(&mut self) {
        if self.scissors.pop().is_none() {
            log::warn!("disable_scissoring called with an empty scissor stack");
        }
    }

    pub fn scissor(&self) -> Option<ScissorRegion> {
        self.scissors.last().copied()
    }

    pub fn scissor_depth(&self) -> usize {
        self.scissors.len()
    }

    pub fn addressing(&self) -> Addressing {
        Addressing {
            width: self.width,
            height: self.height,
            layout: self.layout,
            clip: self.scissor(),
        }
    }

    #[inline]
    pub fn pixel_offset(&self, x: i32, y: i32) -> Option<usize> {
        self.addressing().offset(x, y)
    }

    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Colour) {
        self.target().put(x, y, colour, BlendMode::Replace);
    }

    /// Write-over: channels mixed by the new alpha, existing alpha kept
    #[inline]
    pub fn set_pixel_blend_src(&mut self, x: i32, y: i32, colour: Colour) {
        self.target().put(x, y, colour, BlendMode::Over);
    }

    /// Write-under: channels mixed by the new alpha, alpha accumulated
    #[inline]
    pub fn set_pixel_blend_dst(&mut self, x: i32, y: i32, colour: Colour) {
        self.target().put(x, y, colour, BlendMode::Under);
    }

    /// Back-buffer read, ignores the scissor
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Colour> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let offset = self.layout.offset(x as usize, y as usize, self.width);
        Some(Colour(self.back[offset]))
    }

    /// Whole-buffer target honouring the current scissor
    pub fn target(&mut self) -> PixelTarget<'_> {
        let addr = self.addressing();
        PixelTarget {
            pixels: &mut self.back,
            base: 0,
            rows: 0..self.height,
            addr,
        }
    }

    /// Split the back buffer into disjoint row bands
    ///
    /// Bands are contiguous in memory for both layouts, so each one is a plain
    /// `&mut [u16]` that no other band can alias.
    pub fn row_bands(&mut self) -> Vec<PixelTarget<'_>> {
        let addr = self.addressing();
        let band_rows = self.layout.band_rows();
        let band_len = self.width * band_rows;
        let height = self.height;
        self.back
            .chunks_mut(band_len)
            .enumerate()
            .map(|(i, pixels)| {
                let first = i * band_rows;
                PixelTarget {
                    pixels,
                    base: i * band_len,
                    rows: first..(first + band_rows).min(height),
                    addr,
                }
            })
            .collect()
    }

    /// Fill every pixel, scissor ignored
    pub fn fill_screen(&mut self, colour: Colour) {
        self.back.fill(colour.0);
    }

    pub fn clear_screen(&mut self) {
        self.fill_screen(Colour::TRANSPARENT);
    }

    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Raw front buffer in surface layout
    pub fn front(&self) -> &[u16] {
        &self.front
    }

    /// Raw back buffer in surface layout
    pub fn back(&self) -> &[u16] {
        &self.back
    }

    /// Convert the front buffer into row-major 0xAARRGGBB
    ///
    /// `out` must hold at least `width * height` pixels; extra space is left alone.
    pub fn to_argb8888(&self, out: &mut [u32]) {
        let width = self.width;
        for (y, row) in out.chunks_mut(width).take(self.height).enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                let offset = self.layout.offset(x, y, width);
                *px = Colour(self.front[offset]).to_argb8888();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijective(layout: PixelLayout, width: usize, height: usize) {
        let surface = PixelSurface::new(width, height, layout).unwrap();
        let mut seen = vec![false; width * height];
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let offset = surface.pixel_offset(x, y).unwrap();
                assert!(offset < width * height, "offset {} out of range", offset);
                assert!(!seen[offset], "offset {} hit twice", offset);
                seen[offset] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_tiled_offset_is_bijection() {
        assert_bijective(PixelLayout::Tiled, 64, 256);
        assert_bijective(PixelLayout::Tiled, 448, 768);
    }

    #[test]
    fn test_row_major_offset_is_bijection() {
        assert_bijective(PixelLayout::RowMajor, 30, 17);
    }

    #[test]
    fn test_tiled_is_not_row_major() {
        let surface = PixelSurface::new(64, 128, PixelLayout::Tiled).unwrap();
        // second row starts inside the first 32x16 block, not at x = width
        assert_eq!(surface.pixel_offset(0, 1), Some(8));
        assert_eq!(surface.pixel_offset(8, 0), Some(16));
    }

    #[test]
    fn test_tiled_bands_are_contiguous() {
        let width = 96;
        let surface = PixelSurface::new(width, 256, PixelLayout::Tiled).unwrap();
        for y in 0..256 {
            for x in 0..width {
                let offset = surface.pixel_offset(x as i32, y as i32).unwrap();
                assert_eq!(offset / (width * TILE_BAND_ROWS), y / TILE_BAND_ROWS);
            }
        }
    }

    #[test]
    fn test_tiled_rejects_unaligned_size() {
        assert!(matches!(
            PixelSurface::new(448, 720, PixelLayout::Tiled),
            Err(SurfaceError::UnalignedTiledSize { .. })
        ));
        assert!(PixelSurface::new(448, 720, PixelLayout::RowMajor).is_ok());
        assert!(matches!(
            PixelSurface::new(0, 10, PixelLayout::RowMajor),
            Err(SurfaceError::Empty { .. })
        ));
    }

    #[test]
    fn test_scissor_rejects_outside_writes() {
        let mut surface = PixelSurface::new(64, 128, PixelLayout::Tiled).unwrap();
        surface.fill_screen(Colour::new(1, 2, 3, 4));
        let before = surface.back().to_vec();

        surface.enable_scissoring(10, 10, 5, 5);
        for (x, y) in [(9, 10), (15, 12), (12, 9), (12, 15), (-1, -1), (70, 3)] {
            surface.set_pixel(x, y, Colour::WHITE);
            surface.set_pixel_blend_src(x, y, Colour::WHITE);
            surface.set_pixel_blend_dst(x, y, Colour::WHITE);
        }
        assert_eq!(surface.back(), &before[..]);

        surface.set_pixel(10, 10, Colour::WHITE);
        assert_eq!(surface.get_pixel(10, 10), Some(Colour::WHITE));
        surface.disable_scissoring();
        assert_eq!(surface.scissor_depth(), 0);
    }

    #[test]
    fn test_only_innermost_scissor_is_active() {
        let mut surface = PixelSurface::new(32, 32, PixelLayout::RowMajor).unwrap();
        surface.enable_scissoring(0, 0, 10, 10);
        surface.enable_scissoring(20, 20, 5, 5);
        assert_eq!(surface.pixel_offset(5, 5), None);
        assert!(surface.pixel_offset(21, 21).is_some());
        surface.disable_scissoring();
        assert!(surface.pixel_offset(5, 5).is_some());
        assert_eq!(surface.pixel_offset(21, 21), None);
        surface.disable_scissoring();
        surface.disable_scissoring();
        assert_eq!(surface.scissor_depth(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_dropped() {
        let mut surface = PixelSurface::new(16, 16, PixelLayout::RowMajor).unwrap();
        surface.set_pixel(16, 0, Colour::WHITE);
        surface.set_pixel(0, -1, Colour::WHITE);
        assert!(surface.back().iter().all(|&p| p == 0));
        assert_eq!(surface.get_pixel(16, 0), None);
    }

    #[test]
    fn test_row_bands_cover_buffer() {
        let mut surface = PixelSurface::new(16, 20, PixelLayout::RowMajor).unwrap();
        let bands = surface.row_bands();
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[2].rows(), 16..20);
        let total: usize = bands.iter().map(|b| b.rows().len()).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_band_put_only_reaches_own_rows() {
        let mut surface = PixelSurface::new(16, 16, PixelLayout::RowMajor).unwrap();
        {
            let mut bands = surface.row_bands();
            bands[0].put(3, 12, Colour::WHITE, BlendMode::Replace);
            bands[1].put(3, 12, Colour::BLACK, BlendMode::Replace);
        }
        assert_eq!(surface.get_pixel(3, 12), Some(Colour::BLACK));
    }

    #[test]
    fn test_swap_and_argb_conversion_undo_tiling() {
        let mut surface = PixelSurface::new(32, 128, PixelLayout::Tiled).unwrap();
        surface.set_pixel(5, 7, Colour::new(0xF, 0, 0, 0xF));
        surface.swap_buffers();
        let mut out = vec![0u32; 32 * 128];
        surface.to_argb8888(&mut out);
        assert_eq!(out[7 * 32 + 5], 0xFFFF_0000);
        assert_eq!(out.iter().filter(|&&p| p != 0).count(), 1);
        assert!(surface.back().iter().all(|&p| p == 0));
    }
}
