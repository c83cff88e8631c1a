use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use irradiance_forecast::preprocessing::{prepare, RawColumn, RawTable};
use irradiance_forecast::timeseries::{FeatureBuilder, FeatureConfig};
use irradiance_forecast::training::{XGBoostConfig, XGBoostRegressor};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn create_regression_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    let y = x.rows().into_iter().map(|row| row.sum() + rng.gen::<f64>() * 0.1).collect();
    (x, y)
}

fn create_hourly_table(n_rows: usize) -> RawTable {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
    let hours: Vec<usize> = (0..n_rows).collect();
    let text = |f: &dyn Fn(usize) -> String| -> Vec<Option<String>> { hours.iter().map(|&i| Some(f(i))).collect() };

    RawTable::new(vec![
        RawColumn::new("Year", text(&|_| "2024".to_string())),
        RawColumn::new("Month", text(&|i| (1 + i / (24 * 28) % 12).to_string())),
        RawColumn::new("Day", text(&|i| (1 + (i / 24) % 28).to_string())),
        RawColumn::new("Hour", text(&|i| (i % 24).to_string())),
        RawColumn::new("Minute", text(&|_| "0".to_string())),
        RawColumn::new(
            "GHI",
            hours
                .iter()
                .map(|&i| {
                    let h = (i % 24) as f64;
                    Some((800.0 * (std::f64::consts::PI * (h - 6.0) / 12.0).sin()).max(0.0).to_string())
                })
                .collect(),
        ),
        RawColumn::new("Temperature", hours.iter().map(|_| Some(format!("{:.2}", rng.gen::<f64>() * 30.0))).collect()),
    ])
    .unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [1000, 5000].iter() {
        let (x, y) = create_regression_data(*n_rows, 30);
        let config = XGBoostConfig { n_estimators: 50, ..Default::default() };

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut model = XGBoostRegressor::new(config.clone());
                model.fit(black_box(x), black_box(y)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let (x, y) = create_regression_data(5000, 30);
    let mut model = XGBoostRegressor::new(XGBoostConfig { n_estimators: 100, ..Default::default() });
    model.fit(&x, &y).unwrap();

    for batch in [100, 1000, 5000].iter() {
        let (xb, _) = create_regression_data(*batch, 30);
        group.bench_with_input(BenchmarkId::new("predict", batch), &xb, |b, xb| {
            b.iter(|| model.predict(black_box(xb)).unwrap())
        });
    }

    group.finish();
}

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");

    for n_rows in [2000, 8760].iter() {
        let observations = prepare(create_hourly_table(*n_rows)).unwrap();
        let builder = FeatureBuilder::new(FeatureConfig::default());

        group.bench_with_input(BenchmarkId::new("build", n_rows), &observations, |b, obs| {
            b.iter(|| builder.build(black_box(obs)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction, bench_features);
criterion_main!(benches);
