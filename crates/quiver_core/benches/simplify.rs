use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quiver_core::{cubic_to_quads, CubicBez, Path, Point, SimplifyOptions, SimplifyReport};

fn bench_cubic_to_quads(c: &mut Criterion) {
    let cubic = CubicBez::new(
        Point::new(0.0, 0.0),
        Point::new(0.0, 100.0),
        Point::new(100.0, 100.0),
        Point::new(100.0, 0.0),
    );
    let mut group = c.benchmark_group("cubic_to_quads");
    for tolerance in [1.0, 0.1, 0.001] {
        let options = SimplifyOptions::new(tolerance);
        group.bench_function(format!("tolerance_{tolerance}"), |b| {
            b.iter(|| {
                let mut report = SimplifyReport::default();
                cubic_to_quads(black_box(&cubic), &options, &mut report)
            })
        });
    }
    group.finish();
}

fn bench_path_simplify(c: &mut Criterion) {
    let mut path = Path::new().move_to(0.0, 0.0);
    for i in 0..256 {
        let x = i as f64 * 10.0;
        path = path.cubic_to(x + 2.0, 40.0, x + 8.0, -40.0, x + 10.0, 0.0);
    }
    let options = SimplifyOptions::new(0.05);

    c.bench_function("path_simplify_256_cubics", |b| {
        b.iter(|| {
            let mut path = path.clone();
            path.simplify_cubics(black_box(&options))
        })
    });
}

criterion_group!(benches, bench_cubic_to_quads, bench_path_simplify);
criterion_main!(benches);
