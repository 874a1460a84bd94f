//! Compositor benchmarks.

use std::hint::black_box;

use casement::{
    AppId, Toolkit,
    canvas::Color,
    config::Config,
    geom::{Expanse, Rect},
    testing::MemoryFrameBuffer,
    widgets::Window,
};
use criterion::{Criterion, criterion_group, criterion_main};

/// A toolkit with `n` overlapping windows cascading down the screen.
fn cascade(n: usize, transparent: bool) -> Toolkit {
    let (_, fb) = MemoryFrameBuffer::create(Expanse::new(640, 480));
    let mut tk = Toolkit::init(Config::default(), Box::new(fb)).expect("toolkit");
    for i in 0..n {
        let color = Color::rgb((i % 256) as u8, 0x80, 0x40);
        let mut win = Window::new(color);
        if transparent && i % 2 == 1 {
            win = win.transparent();
        }
        let w = tk.create(AppId(1), win);
        let off = (i % 400) as i32;
        tk.place(w, Rect::new(off, off % 300, 200, 150))
            .expect("place");
        tk.release(w);
    }
    tk.flush();
    tk
}

fn benchmark_full_redraw(c: &mut Criterion) {
    let mut tk = cascade(32, false);
    c.bench_function("full_redraw_32_windows", |b| {
        b.iter(|| {
            tk.draw_area(Rect::new(0, 0, 640, 480));
            black_box(tk.flush());
        });
    });
}

fn benchmark_transparent_redraw(c: &mut Criterion) {
    let mut tk = cascade(32, true);
    c.bench_function("full_redraw_transparent", |b| {
        b.iter(|| {
            tk.draw_area(Rect::new(0, 0, 640, 480));
            black_box(tk.flush());
        });
    });
}

fn benchmark_deep_stack(c: &mut Criterion) {
    let mut tk = cascade(2000, false);
    c.bench_function("deep_stack_redraw", |b| {
        b.iter(|| {
            tk.draw_area(Rect::new(100, 100, 64, 64));
            black_box(tk.flush());
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_full_redraw, benchmark_transparent_redraw, benchmark_deep_stack
}
criterion_main!(benches);
