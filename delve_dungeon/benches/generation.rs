use criterion::{Criterion, criterion_group, criterion_main};
use delve_dungeon::{AdjacencyStrategy, DungeonConfig, Level, PathMode, RoomId, Vec2, generate};
use std::hint::black_box;

fn far_corners(level: &Level) -> (Vec2, Vec2) {
    let first = level.room_center(RoomId(0)).unwrap_or(Vec2::new(0.0, 0.0));
    let last = RoomId(level.graph.room_count().saturating_sub(1) as u32);
    let last = level.room_center(last).unwrap_or(first);
    (first, last)
}

fn benchmark_generation(c: &mut Criterion) {
    let seam = DungeonConfig::default();
    let triangulated = DungeonConfig {
        adjacency: AdjacencyStrategy::Triangulation,
        ..DungeonConfig::default()
    };

    c.bench_function("generate_seam_doors", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            let level = generate(&seam, black_box(seed)).expect("level generates");
            black_box(level.graph.room_count())
        });
    });

    c.bench_function("generate_triangulation", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            let level = generate(&triangulated, black_box(seed)).expect("level generates");
            black_box(level.graph.door_count())
        });
    });
}

fn benchmark_paths(c: &mut Criterion) {
    let level = generate(&DungeonConfig::default(), 7).expect("level generates");
    let (from, to) = far_corners(&level);

    c.bench_function("path_grouped", |b| {
        b.iter(|| black_box(level.find_path(black_box(from), black_box(to), PathMode::Grouped)))
    });

    c.bench_function("path_flat", |b| {
        b.iter(|| black_box(level.find_path(black_box(from), black_box(to), PathMode::Flat)))
    });

    let centers: Vec<Vec2> = level
        .graph
        .room_ids()
        .into_iter()
        .filter_map(|id| level.room_center(id))
        .collect();
    let queries: Vec<(Vec2, Vec2)> = centers
        .iter()
        .flat_map(|&a| centers.iter().map(move |&b| (a, b)))
        .collect();

    c.bench_function("path_batch_all_pairs", |b| {
        b.iter(|| black_box(level.find_paths(&queries, PathMode::Grouped).len()))
    });
}

criterion_group!(benches, benchmark_generation, benchmark_paths);
criterion_main!(benches);
