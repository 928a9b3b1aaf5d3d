//! Rounded-rect fill, single band walk vs the threaded band fill.
//!
//! Sizes cover a list row, a full overlay panel and a whole 1080p backdrop.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use tessera_ui::ui::colour::Colour;
use tessera_ui::ui::drawing::{self, RoundedRect};
use tessera_ui::ui::surface::{PixelLayout, PixelSurface};

const SIZES: [(i32, i32); 3] = [
    (448, 70),    // List row
    (448, 720),   // Overlay
    (1920, 1024), // Backdrop
];

const FILL: Colour = Colour::new(0x2, 0x4, 0x8, 0xC);

fn surface_for(w: i32, h: i32) -> PixelSurface {
    // Round up so the tiled layout is valid too
    let width = (w as usize).div_ceil(32) * 32;
    let height = (h as usize).div_ceil(128) * 128;
    match PixelSurface::new(width, height, PixelLayout::Tiled) {
        Ok(s) => s,
        Err(e) => panic!("bench surface: {}", e),
    }
}

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("rounded_rect_fill");
    for &(w, h) in &SIZES {
        let id = format!("{}x{}", w, h);
        let rect = RoundedRect::new(0, 0, w, h, 12);

        let mut surface = surface_for(w, h);
        group.bench_with_input(BenchmarkId::new("single", &id), &rect, |b, rect| {
            b.iter(|| drawing::draw_rounded_rect(&mut surface.target(), black_box(*rect), FILL))
        });

        let mut surface = surface_for(w, h);
        for workers in [2, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("threaded_{}", workers), &id),
                &rect,
                |b, rect| {
                    b.iter(|| {
                        drawing::draw_rounded_rect_multithreaded(
                            &mut surface,
                            black_box(*rect),
                            FILL,
                            workers,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_fill);
criterion_main!(benches);
