use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::prelude::*;
use regforge::data::split_features_target;
use regforge::models::{RandomForest, RandomForestConfig, XGBoostConfig, XGBoostRegressor};
use regforge::{ModelTrainer, TrainerConfig};

fn create_split(n_rows: usize, n_features: usize) -> (Array2<f64>, Array2<f64>) {
    let mut rng = rand::thread_rng();
    let n_train = n_rows * 4 / 5;

    let mut build = |rows: usize| {
        let mut data = Vec::with_capacity(rows * (n_features + 1));
        for _ in 0..rows {
            let features: Vec<f64> = (0..n_features).map(|_| rng.gen::<f64>() * 10.0).collect();
            let target = features.iter().sum::<f64>() + rng.gen::<f64>() * 0.1;
            data.extend_from_slice(&features);
            data.push(target);
        }
        Array2::from_shape_vec((rows, n_features + 1), data).unwrap()
    };

    let train = build(n_train);
    let test = build(n_rows - n_train);
    (train, test)
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(10); // Full roster per iteration

    let dir = tempfile::tempdir().unwrap();
    for n_rows in [100, 400].iter() {
        let (train, test) = create_split(*n_rows, 5);
        let trainer = ModelTrainer::new(
            TrainerConfig::new().with_artifact_path(dir.path().join("model.bin")),
        );

        group.bench_with_input(
            BenchmarkId::new("train", n_rows),
            &(train, test),
            |b, (train, test)| b.iter(|| trainer.train(black_box(train), black_box(test)).unwrap()),
        );
    }

    group.finish();
}

fn bench_estimator_fits(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator_fit");
    group.sample_size(10);

    let (train, _) = create_split(625, 5);
    let (x, y) = split_features_target(&train);

    group.bench_function("random_forest", |b| {
        b.iter(|| {
            let mut model =
                RandomForest::new(RandomForestConfig::default().with_n_estimators(25));
            model.fit(black_box(&x), black_box(&y)).unwrap()
        })
    });

    group.bench_function("xgboost", |b| {
        b.iter(|| {
            let mut model =
                XGBoostRegressor::new(XGBoostConfig::default().with_n_estimators(25));
            model.fit(black_box(&x), black_box(&y)).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_selection, bench_estimator_fits);
criterion_main!(benches);
