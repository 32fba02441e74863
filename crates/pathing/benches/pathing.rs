use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use pf_core::query::FlatGround;
use pf_graph::DistanceMetric;
use pf_pathing::create_finder;
use pf_test_utils::{grid_graph, random_points};

const SPACING: f32 = 10.;

fn create_finder_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_finder");
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    group.plot_config(plot_config);

    for side in [10, 32, 100, 316] {
        let graph = grid_graph(side, side, SPACING);

        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::from_parameter(side * side), |b| {
            b.iter(|| {
                create_finder(graph.clone(), &FlatGround::default(), DistanceMetric::Manhattan);
            });
        });
    }
}

fn find_path_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    group.plot_config(plot_config);

    for side in [10, 32, 100, 316] {
        let finder = create_finder(
            grid_graph(side, side, SPACING),
            &FlatGround::default(),
            DistanceMetric::Manhattan,
        );

        let extent = 0.5 * SPACING * side as f32;
        let rng = fastrand::Rng::with_seed(side as u64);
        let points: Vec<_> = random_points(&rng, 1000, extent)
            .into_iter()
            .map(|point| point + extent)
            .collect();
        let mut index = 0;

        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::from_parameter(side * side), |b| {
            b.iter(|| {
                let start = points[index];
                index = (index + 1) % points.len();
                let target = points[index];
                index = (index + 1) % points.len();
                finder.find_path_between(start, target).unwrap();
            });
        });
    }
}

criterion_group!(benches, create_finder_benchmark, find_path_benchmark);
criterion_main!(benches);
