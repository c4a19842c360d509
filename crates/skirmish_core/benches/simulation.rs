//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skirmish_core::pathfinding::find_path;
use skirmish_core::prelude::*;

fn maze(size: u32) -> TerrainGrid {
    let mut terrain = TerrainGrid::filled(size, size, TerrainKind::Ground);
    // Alternating walls with a gap at one end.
    for x in (2..size - 1).step_by(2) {
        let gap = if (x / 2) % 2 == 0 { size - 1 } else { 0 };
        for y in 0..size {
            if y != gap {
                terrain.set(GridCoord::new(x, y), TerrainKind::Water);
            }
        }
    }
    terrain
}

/// Runs path search and full-tick benchmarks.
pub fn simulation_benchmark(c: &mut Criterion) {
    let terrain = maze(40);
    let grid = OccupancyGrid::rebuild(&terrain, &UnitRegistry::new());
    let goal = GridCoord::new(39, 39);

    c.bench_function("find_path_maze_40", |b| {
        b.iter(|| {
            black_box(find_path(
                &grid,
                GridCoord::new(0, 0),
                goal,
                DiagonalPolicy::Never,
            ))
        });
    });

    c.bench_function("rebuild_occupancy_40", |b| {
        let units = UnitRegistry::new();
        b.iter(|| black_box(OccupancyGrid::rebuild(&terrain, &units)));
    });

    c.bench_function("outpost_tick", |b| {
        let Ok(level) = Level::outpost() else {
            return;
        };
        let Ok(mut state) = SimulationState::new(EngineConfig::default(), level) else {
            return;
        };
        state.step();
        let mut toggle = false;
        b.iter(|| {
            if state.units().iter().all(Unit::is_idle) {
                let destination = if toggle { GridCoord::new(3, 7) } else { GridCoord::new(9, 0) };
                toggle = !toggle;
                let _ = state.issue_order(UnitId(2), Order::move_to(destination));
            }
            black_box(state.step())
        });
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
