//! Render context: surface, glyph cache, theme and global opacity in one place
//!
//! Every draw call in the element tree receives `&mut Renderer`. Colours pass
//! through the global opacity here, so widgets never touch it themselves.

use super::colour::Colour;
use super::compositing::Opacity;
use super::drawing::{self, Quadrant, RoundedRect};
use super::surface::PixelSurface;
use super::text_rasterizing::{FontSet, GlyphCache, TextStyle};
use super::theme::Theme;
use crate::config::UiConfig;
use crate::error::{DisplayError, ThemeError};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Rounded rects at least this tall take the threaded fill when enabled
pub const MT_MIN_ROWS: i32 = 64;

/// Where finished frames go
pub trait Display {
    fn present(&mut self, surface: &PixelSurface) -> Result<(), DisplayError>;

    /// Block until the next frame may start
    fn wait_for_vsync(&mut self);
}

/// Off-screen display that keeps the last frame and paces to a fixed interval
pub struct HeadlessDisplay {
    interval: Duration,
    last_vsync: Option<Instant>,
    frames: u64,
    pixels: Vec<u32>,
}

impl HeadlessDisplay {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_vsync: None,
            frames: 0,
            pixels: Vec::new(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Last presented frame, row-major 0xAARRGGBB
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, surface: &PixelSurface) -> Result<(), DisplayError> {
        self.pixels.resize(surface.width() * surface.height(), 0);
        surface.to_argb8888(&mut self.pixels);
        self.frames += 1;
        Ok(())
    }

    fn wait_for_vsync(&mut self) {
        if let Some(last) = self.last_vsync {
            let next = last + self.interval;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            }
        }
        self.last_vsync = Some(Instant::now());
    }
}

pub struct Renderer {
    surface: PixelSurface,
    glyphs: GlyphCache,
    theme: Theme,
    theme_path: Option<PathBuf>,
    opacity: Opacity,
    multithreaded: bool,
    max_workers: usize,
    frame_start: Instant,
    frames: u64,
}

impl Renderer {
    pub fn new(surface: PixelSurface, fonts: FontSet) -> Self {
        Self {
            surface,
            glyphs: GlyphCache::new(fonts),
            theme: Theme::default(),
            theme_path: None,
            opacity: Opacity::default(),
            multithreaded: false,
            max_workers: 1,
            frame_start: Instant::now(),
            frames: 0,
        }
    }

    /// Build everything the config describes; a missing default font is fatal
    pub fn from_config(config: &UiConfig) -> crate::Result<Self> {
        let surface = PixelSurface::new(
            config.surface.width,
            config.surface.height,
            config.surface.layout,
        )?;
        let fonts = FontSet::from_config(&config.fonts)?;
        let mut renderer = Renderer::new(surface, fonts);
        renderer.glyphs.set_width_table(config.fonts.width_table);
        renderer.set_multithreaded(config.render.multithreaded, config.render.max_workers);
        renderer.opacity = Opacity::new(config.render.opacity, config.render.capture_mode);
        if let Some(path) = &config.theme {
            renderer.theme_path = Some(path.clone());
            renderer.reload_theme()?;
        }
        log::info!(
            "renderer ready: {}x{} {:?}, multithreaded={} (max {} workers)",
            renderer.surface.width(),
            renderer.surface.height(),
            renderer.surface.layout(),
            renderer.multithreaded,
            renderer.max_workers
        );
        Ok(renderer)
    }

    pub fn width(&self) -> usize {
        self.surface.width()
    }

    pub fn height(&self) -> usize {
        self.surface.height()
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    pub fn glyphs_mut(&mut self) -> &mut GlyphCache {
        &mut self.glyphs
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_theme_path(&mut self, path: Option<PathBuf>) {
        self.theme_path = path;
    }

    /// Re-read the theme file; without one the compiled defaults are restored
    pub fn reload_theme(&mut self) -> Result<(), ThemeError> {
        self.theme = match &self.theme_path {
            Some(path) => Theme::load(path)?,
            None => Theme::default(),
        };
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity.set(opacity);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity.factor()
    }

    pub fn set_capture_mode(&mut self, enabled: bool) {
        self.opacity.set_capture_mode(enabled);
    }

    pub fn set_multithreaded(&mut self, enabled: bool, max_workers: usize) {
        self.multithreaded = enabled && max_workers > 1;
        self.max_workers = max_workers.max(1);
    }

    /// Apply global opacity, as every primitive does
    #[inline]
    pub fn a(&self, colour: Colour) -> Colour {
        self.opacity.apply(colour)
    }

    /// Time the current frame started; animations read this
    pub fn frame_time(&self) -> Instant {
        self.frame_start
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn start_frame(&mut self) {
        self.frame_start = Instant::now();
        self.surface.clear_screen();
    }

    /// Swap, present and block on the display's vsync
    pub fn end_frame(&mut self, display: &mut dyn Display) -> Result<(), DisplayError> {
        if self.surface.scissor_depth() != 0 {
            log::warn!(
                "frame ended with {} scissor regions still active",
                self.surface.scissor_depth()
            );
            while self.surface.scissor_depth() > 0 {
                self.surface.disable_scissoring();
            }
        }
        self.surface.swap_buffers();
        display.present(&self.surface)?;
        display.wait_for_vsync();
        self.frames += 1;
        Ok(())
    }

    pub fn enable_scissoring(&mut self, x: i32, y: i32, w: u32, h: u32) {
        self.surface.enable_scissoring(x, y, w, h);
    }

    pub fn disable_scissoring(&mut self) {
        self.surface.disable_scissoring();
    }

    pub fn fill_screen(&mut self, colour: Colour) {
        let colour = self.a(colour);
        self.surface.fill_screen(colour);
    }

    pub fn clear_screen(&mut self) {
        self.surface.clear_screen();
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: Colour) {
        let colour = self.a(colour);
        drawing::draw_rect(&mut self.surface.target(), x, y, w, h, colour);
    }

    pub fn draw_empty_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: Colour) {
        let colour = self.a(colour);
        drawing::draw_empty_rect(&mut self.surface.target(), x, y, w, h, colour);
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Colour) {
        let colour = self.a(colour);
        drawing::draw_line(&mut self.surface.target(), x0, y0, x1, y1, colour);
    }

    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: u16, filled: bool, colour: Colour) {
        let colour = self.a(colour);
        drawing::draw_circle(&mut self.surface.target(), cx, cy, radius, filled, colour);
    }

    pub fn draw_quarter_circle(
        &mut self,
        cx: i32,
        cy: i32,
        radius: u16,
        filled: bool,
        quadrant: Quadrant,
        colour: Colour,
    ) {
        let colour = self.a(colour);
        drawing::draw_quarter_circle(
            &mut self.surface.target(),
            cx,
            cy,
            radius,
            filled,
            quadrant,
            colour,
        );
    }

    /// General rounded rect; large ones go through the threaded fill when enabled
    pub fn draw_rounded_rect(&mut self, x: i32, y: i32, w: i32, h: i32, radius: i32, colour: Colour) {
        let colour = self.a(colour);
        let rect = RoundedRect::new(x, y, w, h, radius);
        if self.multithreaded && rect.h >= MT_MIN_ROWS {
            drawing::draw_rounded_rect_multithreaded(&mut self.surface, rect, colour, self.max_workers);
        } else {
            drawing::draw_rounded_rect(&mut self.surface.target(), rect, colour);
        }
    }

    pub fn draw_uniform_rounded_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: Colour) {
        let colour = self.a(colour);
        drawing::draw_uniform_rounded_rect(&mut self.surface.target(), x, y, w, h, colour);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_bordered_rounded_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        thickness: i32,
        radius: u16,
        colour: Colour,
    ) {
        let colour = self.a(colour);
        drawing::draw_bordered_rounded_rect(
            &mut self.surface.target(),
            x,
            y,
            w,
            h,
            thickness,
            radius,
            colour,
        );
    }

    /// RGBA8888 bitmap, 4 bytes per pixel
    pub fn draw_bitmap(&mut self, x: i32, y: i32, w: u32, h: u32, rgba: &[u8]) {
        let opacity = self.opacity;
        drawing::draw_bitmap(&mut self.surface.target(), x, y, w, h, rgba, &opacity);
    }

    /// Draw with `y` as the baseline; returns (width, height)
    pub fn draw_string(
        &mut self,
        text: impl AsRef<[u8]>,
        x: i32,
        y: i32,
        style: TextStyle,
        colour: Colour,
    ) -> (f32, f32) {
        self.draw_string_limited(text, x, y, style, colour, None)
    }

    pub fn draw_string_limited(
        &mut self,
        text: impl AsRef<[u8]>,
        x: i32,
        y: i32,
        style: TextStyle,
        colour: Colour,
        max_width: Option<f32>,
    ) -> (f32, f32) {
        let colour = self.a(colour);
        self.glyphs.draw_string(
            &mut self.surface.target(),
            text,
            x,
            y,
            style,
            colour,
            max_width,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_with_coloured_sections(
        &mut self,
        text: impl AsRef<[u8]>,
        specials: &[&str],
        x: i32,
        y: i32,
        style: TextStyle,
        default_colour: Colour,
        special_colour: Colour,
    ) -> (f32, f32) {
        let default_colour = self.a(default_colour);
        let special_colour = self.a(special_colour);
        self.glyphs.draw_string_with_coloured_sections(
            &mut self.surface.target(),
            text,
            specials,
            x,
            y,
            style,
            default_colour,
            special_colour,
        )
    }

    pub fn calculate_string_width(&mut self, text: impl AsRef<[u8]>, style: TextStyle) -> f32 {
        self.glyphs.calculate_string_width(text, style)
    }

    pub fn limit_string_length(
        &mut self,
        text: impl AsRef<[u8]>,
        limit: f32,
        style: TextStyle,
    ) -> String {
        self.glyphs.limit_string_length(text, limit, style)
    }
}

/// Row-major renderer with the blocky test font
#[cfg(test)]
pub(crate) fn test_renderer(width: usize, height: usize) -> Renderer {
    use super::surface::PixelLayout;
    use super::text_rasterizing::test_fonts;
    match PixelSurface::new(width, height, PixelLayout::RowMajor) {
        Ok(surface) => Renderer::new(surface, test_fonts()),
        Err(e) => panic!("test surface: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_applies_to_primitives() {
        let mut r = test_renderer(16, 16);
        r.set_opacity(0.5);
        r.draw_rect(0, 0, 1, 1, Colour::WHITE);
        assert_eq!(r.surface().get_pixel(0, 0).unwrap().a(), 7);

        r.set_capture_mode(true);
        r.draw_rect(1, 0, 1, 1, Colour::new(0xF, 0xF, 0xF, 0x2));
        assert_eq!(r.surface().get_pixel(1, 0).unwrap().a(), 0xF);
    }

    #[test]
    fn test_zero_opacity_draws_nothing_visible() {
        let mut r = test_renderer(64, 64);
        r.set_opacity(0.0);
        let (w, _) = r.draw_string("abc", 0, 30, TextStyle::new(20.0), Colour::WHITE);
        assert!(w > 0.0);
        r.draw_rect(0, 0, 10, 10, Colour::new(0xF, 0, 0, 0xF));
        assert!(r.surface().back().iter().all(|&p| Colour(p).a() == 0));
    }

    #[test]
    fn test_frame_bracketing_presents_back_buffer() {
        let mut r = test_renderer(8, 8);
        let mut display = HeadlessDisplay::new(Duration::ZERO);
        r.start_frame();
        r.draw_rect(2, 2, 1, 1, Colour::new(0xF, 0, 0, 0xF));
        r.enable_scissoring(0, 0, 1, 1);
        r.end_frame(&mut display).unwrap();

        assert_eq!(display.frames(), 1);
        assert_eq!(r.frames(), 1);
        assert_eq!(display.pixels()[2 * 8 + 2], 0xFFFF_0000);
        assert_eq!(r.surface().scissor_depth(), 0);

        r.start_frame();
        assert!(r.surface().back().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_headless_display_paces_frames() {
        let mut r = test_renderer(4, 4);
        let mut display = HeadlessDisplay::new(Duration::from_millis(5));
        let started = Instant::now();
        for _ in 0..3 {
            r.start_frame();
            r.end_frame(&mut display).unwrap();
        }
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_threaded_rounded_rect_matches_single_thread() {
        let mut single = test_renderer(120, 200);
        let mut threaded = test_renderer(120, 200);
        threaded.set_multithreaded(true, 4);
        let colour = Colour::new(0x2, 0x4, 0x6, 0xC);
        single.draw_rounded_rect(3, 4, 110, 180, 12, colour);
        threaded.draw_rounded_rect(3, 4, 110, 180, 12, colour);
        assert_eq!(single.surface().back(), threaded.surface().back());
    }

    #[test]
    fn test_reload_theme_from_file() {
        let path = std::env::temp_dir().join(format!("tessera-theme-{}.toml", std::process::id()));
        std::fs::write(&path, "[colours]\nseparator = \"#FFFF\"\n").unwrap();

        let mut r = test_renderer(4, 4);
        r.set_theme_path(Some(path.clone()));
        r.reload_theme().unwrap();
        assert_eq!(r.theme().separator, Colour::WHITE);

        std::fs::write(&path, "[colours]\nseparator = \"#000F\"\n").unwrap();
        r.reload_theme().unwrap();
        assert_eq!(r.theme().separator, Colour::BLACK);

        r.set_theme_path(None);
        r.reload_theme().unwrap();
        assert_eq!(r.theme(), &Theme::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_default_font_fails_from_config() {
        let config = UiConfig::default();
        assert!(matches!(
            Renderer::from_config(&config),
            Err(crate::error::Error::Font(crate::error::FontError::MissingDefault))
        ));
    }
}
