//! Integration test: Full lifecycle (provide → preprocess → train → persist → predict)

use loan_approval::data::{read_loan_csv, DataOrigin, DatasetProvider, LoanRecord, LoanStatus};
use loan_approval::export::ModelStore;
use loan_approval::inference::{BundleState, ModelService, PredictionOutcome};
use loan_approval::training::{ModelTrainer, TrainerConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

fn reference_request() -> LoanRecord {
    LoanRecord {
        gender: Some("Male".to_string()),
        married: Some("Yes".to_string()),
        dependents: Some("0".to_string()),
        education: Some("Graduate".to_string()),
        self_employed: Some("No".to_string()),
        applicant_income: Some(5000.0),
        coapplicant_income: Some(0.0),
        loan_amount: Some(150.0),
        loan_amount_term: Some(360),
        credit_history: Some(1),
        property_area: Some("Urban".to_string()),
        loan_status: None,
    }
}

fn trainer(sample_size: usize) -> ModelTrainer {
    ModelTrainer::new(
        TrainerConfig::default().with_seed(42),
        DatasetProvider::new(sample_size, 42),
    )
}

fn service(dir: &TempDir, sample_size: usize) -> ModelService {
    ModelService::new(
        dir.path().join("loan_data.csv"),
        ModelStore::new(dir.path().join("loan_model.bin")),
        trainer(sample_size),
    )
}

#[test]
fn test_training_is_reproducible() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();

    let first = trainer(1000)
        .train(
            &first_dir.path().join("loan_data.csv"),
            &ModelStore::new(first_dir.path().join("loan_model.bin")),
        )
        .unwrap();
    let second = trainer(1000)
        .train(
            &second_dir.path().join("loan_data.csv"),
            &ModelStore::new(second_dir.path().join("loan_model.bin")),
        )
        .unwrap();

    assert_eq!(first.origin, DataOrigin::Synthesized { persisted: true });
    assert_eq!(first.metrics().model_name, second.metrics().model_name);
    assert_eq!(first.metrics().accuracy, second.metrics().accuracy);
    assert_eq!(first.metrics().candidates, second.metrics().candidates);
    assert_eq!(first.metrics().training_samples + first.metrics().test_samples, 1000);

    let accuracy = first.metrics().accuracy;
    assert!((0.7..=1.0).contains(&accuracy), "accuracy {accuracy} outside expected band");

    let persisted = read_loan_csv(&first_dir.path().join("loan_data.csv")).unwrap();
    assert_eq!(persisted.len(), 1000);
}

#[test]
fn test_second_run_loads_persisted_table() {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("loan_data.csv");
    let store = ModelStore::new(dir.path().join("loan_model.bin"));

    let first = trainer(300).train(&data_path, &store).unwrap();
    let second = trainer(300).train(&data_path, &store).unwrap();
    assert_eq!(second.origin, DataOrigin::Loaded);
    assert_eq!(first.metrics().test_samples, second.metrics().test_samples);
    assert_eq!(first.metrics().training_samples, second.metrics().training_samples);
}

#[test]
fn test_predict_before_training() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, 300);
    assert_eq!(svc.state(), BundleState::Absent);
    assert_eq!(svc.predict(&reference_request()).as_pair(), (None, 0.0));
}

#[test]
fn test_reference_request_after_training() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, 1000);
    svc.retrain().unwrap();

    let outcome = svc.predict(&reference_request());
    let (label, confidence) = outcome.as_pair();
    let label = label.expect("trained model should predict");
    assert!(label <= 1);
    assert!((0.5..=1.0).contains(&confidence));

    // The reference applicant scores well on every driver of approval
    let prediction = outcome.prediction().unwrap();
    assert_eq!(prediction.status, LoanStatus::Approved);
}

#[test]
fn test_reload_gives_identical_predictions() {
    let dir = TempDir::new().unwrap();
    let trained = service(&dir, 500);
    trained.retrain().unwrap();

    let restarted = service(&dir, 500);
    assert_eq!(restarted.state(), BundleState::Cold);

    let rows = loan_approval::data::SyntheticLoanGenerator::new(50).with_seed(7).generate().unwrap();
    for row in &rows {
        assert_eq!(trained.predict(row), restarted.predict(row));
    }
}

#[test]
fn test_retrain_twice_keeps_one_artifact() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, 300);

    svc.retrain().unwrap();
    std::fs::remove_file(dir.path().join("loan_data.csv")).unwrap();
    let second = svc.retrain().unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name != "loan_data.csv")
        .collect();
    assert_eq!(entries, vec!["loan_model.bin".to_string()]);

    assert_eq!(svc.metrics().unwrap(), second);
    let stored = ModelStore::new(dir.path().join("loan_model.bin")).load().unwrap().unwrap();
    assert_eq!(stored.metrics, second);
}

#[test]
fn test_unseen_category_and_missing_amount() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, 300);
    svc.retrain().unwrap();

    let mut request = reference_request();
    request.property_area = Some("Suburban".to_string());
    assert!(matches!(svc.predict(&request), PredictionOutcome::Ready(_)));

    // a lone request has no other rows to impute a numeric value from
    request.loan_amount = None;
    assert_eq!(svc.predict(&request).as_pair(), (None, 0.0));
}

#[test]
fn test_predictions_during_retrain_see_whole_bundles() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, 300);
    svc.retrain().unwrap();

    let requests: Vec<LoanRecord> = loan_approval::data::SyntheticLoanGenerator::new(20)
        .with_seed(7)
        .generate()
        .unwrap()
        .into_iter()
        .map(|r| LoanRecord { loan_status: None, ..r })
        .collect();
    let retraining_done = AtomicBool::new(false);

    let second = std::thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    let mut served = 0usize;
                    while served == 0 || !retraining_done.load(Ordering::Acquire) {
                        for request in &requests {
                            match svc.predict(request) {
                                PredictionOutcome::Ready(prediction) => {
                                    assert!(prediction.label() <= 1);
                                    assert!((0.0..=1.0).contains(&prediction.confidence));
                                }
                                other => panic!("prediction unavailable mid-retrain: {other:?}"),
                            }
                            served += 1;
                        }
                    }
                    served
                })
            })
            .collect();

        let writer = s.spawn(|| {
            let result = svc.retrain().and_then(|_| svc.retrain());
            retraining_done.store(true, Ordering::Release);
            result.unwrap()
        });

        let second = writer.join().unwrap();
        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
        second
    });

    assert_eq!(svc.metrics().unwrap(), second);
    assert_eq!(svc.state(), BundleState::Loaded);
}
