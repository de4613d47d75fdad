use criterion::{criterion_group, criterion_main, Criterion};
use mandelzoom::{ColorPalette, EngineConfig, EscapeTimeEngine, FrameScheduler, Viewport};
use num::Complex;

fn deep_zoom() -> (Viewport, EscapeTimeEngine) {
    let viewport = Viewport::new(Complex::new(-1.162_779, 0.271_344_8), 0.001, 700).unwrap();
    let engine = EscapeTimeEngine::new(EngineConfig::new(0.1, 0.5, None).unwrap());
    (viewport, engine)
}

fn resolve_benchmark(c: &mut Criterion) {
    let (viewport, engine) = deep_zoom();
    let points = viewport.points(&viewport.full_region());
    c.bench_function("resolve 700x700", move |b| b.iter(|| engine.resolve(&points)));
}

fn frame_benchmark(c: &mut Criterion) {
    let (viewport, engine) = deep_zoom();
    let palette = ColorPalette::generate(200).unwrap();
    let scheduler = FrameScheduler::new(8).unwrap();
    c.bench_function("frame 700x700, 8 workers", move |b| {
        b.iter(|| scheduler.render(&viewport, &palette, &engine).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = resolve_benchmark, frame_benchmark
}
criterion_main!(benches);
