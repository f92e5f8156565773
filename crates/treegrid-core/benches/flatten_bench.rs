//! Benchmarks for flattening, toggling and windowing.
//!
//! Run with: cargo bench -p treegrid-core

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use treegrid_core::filter::Visibility;
use treegrid_core::flatten::{FlatSequence, flatten};
use treegrid_core::toggle::toggle_folder;
use treegrid_core::tree::{IdPolicy, TreeModel};
use treegrid_core::window::WindowState;
use treegrid_core::{GridHooks, GridOptions, NodePayload, SourceData, TreeGrid};

/// `folders` root folders, each with `leaves` leaves; every other folder open.
fn forest(folders: usize, leaves: usize) -> Vec<NodePayload> {
    (0..folders)
        .map(|f| {
            let children = (0..leaves)
                .map(|l| NodePayload::leaf(format!("item {f}.{l}")))
                .collect();
            NodePayload::folder(format!("folder {f}"), children).with_open(f % 2 == 0)
        })
        .collect()
}

fn tree_of(folders: usize, leaves: usize) -> TreeModel {
    let mut tree = TreeModel::new();
    let root = tree.root_id();
    tree.insert_payloads(root, forest(folders, leaves), IdPolicy::Reject)
        .expect("bench tree");
    tree
}

// ============================================================================
// Full flatten
// ============================================================================

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten/full");
    for (folders, leaves) in [(10, 100), (100, 100), (1000, 100)] {
        let mut tree = tree_of(folders, leaves);
        let mut rows = FlatSequence::new();
        group.bench_with_input(
            BenchmarkId::from_parameter(folders * (leaves + 1)),
            &(),
            |b, _| {
                b.iter(|| {
                    black_box(flatten(&mut tree, &mut rows));
                })
            },
        );
    }
    group.finish();
}

// ============================================================================
// Toggle
// ============================================================================

fn bench_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten/toggle");
    for leaves in [100, 1_000, 10_000] {
        let mut tree = tree_of(50, leaves);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);
        let middle = 25 * (leaves + 1);
        group.bench_with_input(BenchmarkId::from_parameter(leaves), &(), |b, _| {
            b.iter(|| {
                black_box(toggle_folder(&mut tree, &mut rows, middle).expect("folder row"));
            })
        });
    }
    group.finish();
}

// ============================================================================
// Visible set and window
// ============================================================================

fn bench_compute_visible(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten/compute_visible");
    for folders in [100, 1_000] {
        let mut tree = tree_of(folders, 100);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);
        let mut window = WindowState::new(15);
        group.bench_with_input(BenchmarkId::from_parameter(rows.len()), &(), |b, _| {
            b.iter(|| black_box(window.compute_visible(&rows, Visibility::Expanded, 0)))
        });
    }
    group.finish();
}

fn bench_grid_filter(c: &mut Criterion) {
    let mut grid = TreeGrid::new(GridOptions::default(), GridHooks::new()).expect("options");
    grid.load(SourceData::Roots(forest(500, 100)))
        .expect("load");
    c.bench_function("flatten/grid_filter_toggle", |b| {
        b.iter(|| {
            black_box(grid.set_filter("item 42"));
            black_box(grid.set_filter(""));
        })
    });
}

criterion_group!(
    benches,
    bench_flatten,
    bench_toggle,
    bench_compute_visible,
    bench_grid_filter
);
criterion_main!(benches);
