use beatmix::gaussian_mixture::GaussianMixtureModel;
use beatmix::generate::generate_blobs;
use beatmix::traits::Fit;
use beatmix::{PipelineParams, RecordTable};
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_isaac::Isaac64Rng;
use serde_json::{json, Value};

const N_BEATS: usize = 4;

/// `N_BEATS` blobs of `blob_size` points, each blob tagged with its own beat code
fn beat_table(blob_size: usize, rng: &mut Isaac64Rng) -> RecordTable {
    let centroids = Array2::random_using((N_BEATS, 2), Uniform::new(-30., 30.), rng);
    let points = generate_blobs(blob_size, &centroids, rng);
    let rows = points
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, point)| {
            vec![
                json!(point[0]),
                json!(point[1]),
                Value::from(format!("B{:02}", i / blob_size)),
            ]
        })
        .collect();
    RecordTable::new(
        vec!["Latitude".into(), "Longitude".into(), "Beat Code".into()],
        rows,
    )
    .expect("well formed table")
}

fn gaussian_mixture_bench(c: &mut Criterion) {
    let mut rng = Isaac64Rng::seed_from_u64(40);
    let mut group = c.benchmark_group("gaussian_mixture");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for cluster_size in [10, 100, 1000] {
        let centroids = Array2::random_using((N_BEATS, 2), Uniform::new(-30., 30.), &mut rng);
        let observations = generate_blobs(cluster_size, &centroids, &mut rng);
        group.bench_with_input(
            BenchmarkId::from_parameter(cluster_size),
            &observations,
            |bencher, observations| {
                bencher.iter(|| {
                    black_box(
                        GaussianMixtureModel::params(N_BEATS)
                            .with_rng(rng.clone())
                            .tolerance(1e-3)
                            .max_n_iterations(1000)
                            .fit(observations)
                            .expect("GMM fitting fail"),
                    )
                })
            },
        );
    }
    group.finish();
}

fn pipeline_bench(c: &mut Criterion) {
    let mut rng = Isaac64Rng::seed_from_u64(40);
    let mut group = c.benchmark_group("pipeline");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for cluster_size in [10, 100, 1000] {
        let table = beat_table(cluster_size, &mut rng);
        group.bench_with_input(
            BenchmarkId::from_parameter(cluster_size),
            &table,
            |bencher, table| {
                bencher.iter(|| {
                    black_box(
                        PipelineParams::new()
                            .run(table.clone())
                            .expect("clustering fail"),
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default();
  targets = gaussian_mixture_bench, pipeline_bench
}
criterion_main!(benches);
