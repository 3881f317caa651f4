use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loan_approval::data::{DatasetProvider, LoanRecord, SyntheticLoanGenerator};
use loan_approval::training::{ModelTrainer, TrainerConfig};

fn trainer(n_rows: usize) -> ModelTrainer {
    ModelTrainer::new(TrainerConfig::default(), DatasetProvider::new(n_rows, 42))
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 1000, 5000].iter() {
        let rows = SyntheticLoanGenerator::new(*n_rows).generate().unwrap();

        group.bench_with_input(BenchmarkId::new("fit_rows", n_rows), &rows, |b, rows| {
            let trainer = trainer(*n_rows);
            b.iter(|| trainer.fit_rows(black_box(rows)).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let rows = SyntheticLoanGenerator::new(1000).generate().unwrap();
    let bundle = trainer(1000).fit_rows(&rows).unwrap();

    let requests: Vec<LoanRecord> = SyntheticLoanGenerator::new(100)
        .with_seed(7)
        .generate()
        .unwrap()
        .into_iter()
        .map(|mut r| {
            r.loan_status = None;
            r
        })
        .collect();

    group.bench_function("single_record", |b| {
        b.iter(|| bundle.predict(black_box(&requests[0])))
    });

    group.bench_with_input(
        BenchmarkId::new("records", requests.len()),
        &requests,
        |b, requests| {
            b.iter(|| {
                requests
                    .iter()
                    .filter(|r| bundle.predict(black_box(r)).is_ready())
                    .count()
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
