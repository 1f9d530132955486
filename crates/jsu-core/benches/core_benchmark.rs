use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use jsu_core::Shape;
use jsu_core::shape::broadcast_all;
use std::hint::black_box;

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("core_shape");

    for rank in [1usize, 4, 8] {
        // Four parameter shapes of the given rank with size-1 holes.
        let shapes: Vec<Shape> = (0..4)
            .map(|p| Shape::new((0..rank).map(|d| if (d + p) % 2 == 0 { 3 } else { 1 }).collect::<Vec<_>>()))
            .collect();
        group.bench_with_input(BenchmarkId::new("broadcast_all", rank), &shapes, |b, s| {
            b.iter(|| black_box(broadcast_all(s.iter())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_broadcast);
criterion_main!(benches);
