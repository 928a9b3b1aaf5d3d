//! Shape primitives
//!
//! Everything here draws into a `PixelTarget`, so the same code fills the
//! whole back buffer or a single row band on a worker thread. Colours arrive
//! with global opacity already applied.

use super::colour::Colour;
use super::compositing::Opacity;
use super::surface::{BlendMode, PixelSurface, PixelTarget};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Corner of a circle plotted by `draw_quarter_circle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopRight = 1,
    TopLeft = 2,
    BottomLeft = 3,
    BottomRight = 4,
}

/// Rectangle with one radius shared by all four corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundedRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub radius: i32,
}

impl RoundedRect {
    /// Radius is clamped to half the shorter side
    pub fn new(x: i32, y: i32, w: i32, h: i32, radius: i32) -> Self {
        let w = w.max(0);
        let h = h.max(0);
        let radius = radius.clamp(0, w.min(h) / 2);
        Self { x, y, w, h, radius }
    }

    /// Rows the shape touches, clipped to `0..limit`
    pub fn rows(&self, limit: usize) -> Range<usize> {
        clip_span(self.y, self.h, limit)
    }

    /// 9-zone coverage test for one pixel
    ///
    /// Corners are tested on pixel centres in doubled coordinates so the shape
    /// is symmetric; edge bands and the interior are always covered.
    #[inline]
    pub fn covers(&self, px: i32, py: i32) -> bool {
        let r = self.radius;
        let left = px < self.x + r;
        let right = px >= self.x + self.w - r;
        let top = py < self.y + r;
        let bottom = py >= self.y + self.h - r;
        if !((left || right) && (top || bottom)) {
            return true;
        }
        let dx = if left {
            2 * (self.x + r) - (2 * px + 1)
        } else {
            (2 * px + 1) - 2 * (self.x + self.w - r)
        };
        let dy = if top {
            2 * (self.y + r) - (2 * py + 1)
        } else {
            (2 * py + 1) - 2 * (self.y + self.h - r)
        };
        dx * dx + dy * dy <= 4 * r * r
    }
}

#[inline]
fn clip_span(start: i32, len: i32, limit: usize) -> Range<usize> {
    let lo = start.max(0) as usize;
    let hi = (start as i64 + len.max(0) as i64).clamp(0, limit as i64) as usize;
    lo.min(hi)..hi
}

#[inline]
fn intersect(a: Range<usize>, b: &Range<usize>) -> Range<usize> {
    a.start.max(b.start)..a.end.min(b.end)
}

/// Filled rectangle, write-under per pixel
pub fn draw_rect(target: &mut PixelTarget, x: i32, y: i32, w: i32, h: i32, colour: Colour) {
    let addr = *target.addressing();
    let rows = intersect(clip_span(y, h, addr.height), &target.rows());
    let cols = clip_span(x, w, addr.width);
    for y1 in rows {
        for x1 in cols.clone() {
            target.put(x1 as i32, y1 as i32, colour, BlendMode::Under);
        }
    }
}

/// One-pixel outline
pub fn draw_empty_rect(target: &mut PixelTarget, x: i32, y: i32, w: i32, h: i32, colour: Colour) {
    if w <= 0 || h <= 0 {
        return;
    }
    draw_line(target, x, y, x + w - 1, y, colour);
    if h > 1 {
        draw_line(target, x, y + h - 1, x + w - 1, y + h - 1, colour);
    }
    if h > 2 {
        draw_line(target, x, y + 1, x, y + h - 2, colour);
        if w > 1 {
            draw_line(target, x + w - 1, y + 1, x + w - 1, y + h - 2, colour);
        }
    }
}

/// Bresenham line, both endpoints inclusive
pub fn draw_line(target: &mut PixelTarget, x0: i32, y0: i32, x1: i32, y1: i32, colour: Colour) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;
    loop {
        target.put(x, y, colour, BlendMode::Under);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Midpoint circle: half-width of the filled span at each row offset 0..=radius
fn circle_spans(radius: i32) -> Vec<i32> {
    let mut spans = vec![0; radius.max(0) as usize + 1];
    let mut x = radius;
    let mut y = 0;
    let mut radius_error = 0;
    let mut x_change = 1 - (radius << 1);
    let mut y_change = 0;
    while x >= y {
        spans[y as usize] = spans[y as usize].max(x);
        spans[x as usize] = spans[x as usize].max(y);
        y += 1;
        radius_error += y_change;
        y_change += 2;
        if (radius_error << 1) + x_change > 0 {
            x -= 1;
            radius_error += x_change;
            x_change += 2;
        }
    }
    spans
}

/// Midpoint circle outline points, one octant mirrored eight ways
fn circle_outline(radius: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();
    let mut x = radius;
    let mut y = 0;
    let mut radius_error = 0;
    let mut x_change = 1 - (radius << 1);
    let mut y_change = 0;
    while x >= y {
        points.push((x, y));
        y += 1;
        radius_error += y_change;
        y_change += 2;
        if (radius_error << 1) + x_change > 0 {
            x -= 1;
            radius_error += x_change;
            x_change += 2;
        }
    }
    points
}

pub fn draw_circle(
    target: &mut PixelTarget,
    cx: i32,
    cy: i32,
    radius: u16,
    filled: bool,
    colour: Colour,
) {
    let r = radius as i32;
    if filled {
        // One span per row so overlapping octants never blend twice
        for (dy, &hw) in circle_spans(r).iter().enumerate() {
            let dy = dy as i32;
            for x in cx - hw..=cx + hw {
                target.put(x, cy + dy, colour, BlendMode::Under);
                if dy != 0 {
                    target.put(x, cy - dy, colour, BlendMode::Under);
                }
            }
        }
        return;
    }
    let mut plotted: Vec<(i32, i32)> = Vec::new();
    for (x, y) in circle_outline(r) {
        for (px, py) in [
            (cx + x, cy + y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx - x, cy + y),
            (cx - x, cy - y),
            (cx - y, cy - x),
            (cx + y, cy - x),
            (cx + x, cy - y),
        ] {
            if !plotted.contains(&(px, py)) {
                plotted.push((px, py));
                target.put(px, py, colour, BlendMode::Under);
            }
        }
    }
}

/// One quarter of a midpoint circle, used for rounded corners
pub fn draw_quarter_circle(
    target: &mut PixelTarget,
    cx: i32,
    cy: i32,
    radius: u16,
    filled: bool,
    quadrant: Quadrant,
    colour: Colour,
) {
    let r = radius as i32;
    let (sx, sy) = match quadrant {
        Quadrant::TopRight => (1, -1),
        Quadrant::TopLeft => (-1, -1),
        Quadrant::BottomLeft => (-1, 1),
        Quadrant::BottomRight => (1, 1),
    };
    if filled {
        for (dy, &hw) in circle_spans(r).iter().enumerate() {
            for dx in 0..=hw {
                target.put(cx + sx * dx, cy + sy * dy as i32, colour, BlendMode::Under);
            }
        }
        return;
    }
    let mut plotted: Vec<(i32, i32)> = Vec::new();
    for (x, y) in circle_outline(r) {
        for (dx, dy) in [(x, y), (y, x)] {
            let p = (cx + sx * dx, cy + sy * dy);
            if !plotted.contains(&p) {
                plotted.push(p);
                target.put(p.0, p.1, colour, BlendMode::Under);
            }
        }
    }
}

/// Fill one row of a rounded rect; shared by the sequential and threaded paths
#[inline]
pub fn fill_rounded_rect_row(target: &mut PixelTarget, rect: &RoundedRect, y: i32, colour: Colour) {
    let width = target.addressing().width;
    for x in clip_span(rect.x, rect.w, width) {
        let x = x as i32;
        if rect.covers(x, y) {
            target.put(x, y, colour, BlendMode::Under);
        }
    }
}

/// Rounded rect with independent radius, single thread
pub fn draw_rounded_rect(target: &mut PixelTarget, rect: RoundedRect, colour: Colour) {
    let rows = intersect(rect.rows(target.addressing().height), &target.rows());
    for y in rows {
        fill_rounded_rect_row(target, &rect, y as i32, colour);
    }
}

/// Usable worker count for the threaded fill
pub fn worker_count(max_workers: usize) -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(max_workers)
        .max(1)
}

/// Rounded rect filled by a bounded set of workers
///
/// The back buffer is split into disjoint row bands. Workers claim bands
/// through an atomic cursor until none are left, and the call returns once all
/// of them have joined. Each band is touched by exactly one worker, so the
/// per-band mutex is never contended.
pub fn draw_rounded_rect_multithreaded(
    surface: &mut PixelSurface,
    rect: RoundedRect,
    colour: Colour,
    max_workers: usize,
) {
    let rows = rect.rows(surface.height());
    if rows.is_empty() || rect.w == 0 {
        return;
    }

    let bands: Vec<Mutex<PixelTarget>> = surface
        .row_bands()
        .into_iter()
        .filter(|band| !intersect(band.rows(), &rows).is_empty())
        .map(Mutex::new)
        .collect();
    let workers = worker_count(max_workers).min(bands.len());
    let cursor = AtomicUsize::new(0);

    rayon::scope(|s| {
        for _ in 0..workers {
            s.spawn(|_| loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(band) = bands.get(index) else {
                    break;
                };
                let mut band = band.lock();
                for y in intersect(band.rows(), &rows) {
                    fill_rounded_rect_row(&mut band, &rect, y as i32, colour);
                }
            });
        }
    });
}

/// Stadium shape: radius is half the shorter side, caps on the long axis
///
/// Tested per pixel centre in doubled coordinates so odd sizes stay symmetric.
pub fn draw_uniform_rounded_rect(
    target: &mut PixelTarget,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    colour: Colour,
) {
    if w <= 0 || h <= 0 {
        return;
    }
    let addr = *target.addressing();
    let horizontal = w >= h;
    let d = w.min(h); // doubled radius
    let rows = intersect(clip_span(y, h, addr.height), &target.rows());
    let cols = clip_span(x, w, addr.width);
    for py in rows {
        let py = py as i32;
        for px in cols.clone() {
            let px = px as i32;
            let (along, across, start, len, mid) = if horizontal {
                (2 * px + 1, 2 * py + 1, 2 * x, 2 * w, 2 * y + h)
            } else {
                (2 * py + 1, 2 * px + 1, 2 * y, 2 * h, 2 * x + w)
            };
            let band_lo = start + d;
            let band_hi = start + len - d;
            let da = if along < band_lo {
                band_lo - along
            } else if along > band_hi {
                along - band_hi
            } else {
                0
            };
            let dc = across - mid;
            if da == 0 || da * da + dc * dc <= d * d {
                target.put(px, py, colour, BlendMode::Under);
            }
        }
    }
}

/// Frame drawn just outside `(x, y, w, h)`: four bars plus rounded corners
pub fn draw_bordered_rounded_rect(
    target: &mut PixelTarget,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    thickness: i32,
    radius: u16,
    colour: Colour,
) {
    if thickness <= 0 || w <= 0 || h <= 0 {
        return;
    }
    draw_rect(target, x, y - thickness, w, thickness, colour);
    draw_rect(target, x, y + h, w, thickness, colour);
    draw_rect(target, x - thickness, y, thickness, h, colour);
    draw_rect(target, x + w, y, thickness, h, colour);

    draw_quarter_circle(target, x - 1, y - 1, radius, true, Quadrant::TopLeft, colour);
    draw_quarter_circle(target, x + w, y - 1, radius, true, Quadrant::TopRight, colour);
    draw_quarter_circle(target, x - 1, y + h, radius, true, Quadrant::BottomLeft, colour);
    draw_quarter_circle(target, x + w, y + h, radius, true, Quadrant::BottomRight, colour);
}

/// Blit RGBA8888 pixels (4 bytes each, row-major), reduced to 4 bits, write-over
pub fn draw_bitmap(
    target: &mut PixelTarget,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    rgba: &[u8],
    opacity: &Opacity,
) {
    let (w, h) = (w as usize, h as usize);
    for (i, px) in rgba.chunks_exact(4).take(w * h).enumerate() {
        let colour = opacity.apply(Colour::from_rgba8888(px[0], px[1], px[2], px[3]));
        let (bx, by) = ((i % w) as i32, (i / w) as i32);
        target.put(x + bx, y + by, colour, BlendMode::Over);
    }
}
