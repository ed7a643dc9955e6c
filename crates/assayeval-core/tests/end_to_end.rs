use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use assayeval_core::testing::{assert_max_rms, assert_min_auc, assert_min_r2};
use assayeval_core::*;
use ndarray::{array, Array1, Array2};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn abc_test_set() -> TestSet {
    [
        ("A", Sample::new([("t1", 1.0)])),
        ("B", Sample::new([("t1", 0.0)])),
        ("C", Sample::new([("t1", -1.0)])),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_missing_label_excluded_and_auc_perfect() -> anyhow::Result<()> {
    init_tracing();
    let task_types = TaskTypes::from([("t1".to_string(), TaskType::Classification)]);
    let model = from_proba_fn(|_| {
        Ok(ScoreArray::Probabilities(array![[0.1, 0.9], [0.8, 0.2], [0.5, 0.5]]).into())
    });

    let results = eval_model(
        &abc_test_set(),
        model.as_ref(),
        &task_types,
        &DescriptorTransforms::new(),
        PredictionConvention::Probability,
        false,
    )?;

    assert_eq!(results.len(), 1);
    assert_eq!(results["t1"].y_true(), &array![1.0, 0.0]);
    assert_eq!(
        results["t1"].y_score(),
        &ScoreArray::Probabilities(array![[0.1, 0.9], [0.8, 0.2]])
    );

    let types = BTreeMap::from([("t1".to_string(), TaskType::Classification)]);
    let auc = compute_roc_auc_scores(&results, &types)?;
    assert_eq!(auc.len(), 1);
    assert_abs_diff_eq!(auc["t1"], 1.0, epsilon = 1e-12);
    Ok(())
}

/// Echoes feature columns back: column 0 as the class-1 probability of the
/// classification task, column 1 as the regression prediction.
fn echo_model() -> Arc<dyn Model> {
    from_predict_fn(|x| {
        let n = x.nrows();
        let mut probs = Array2::zeros((n, 2));
        for i in 0..n {
            probs[[i, 0]] = 1.0 - x[[i, 0]];
            probs[[i, 1]] = x[[i, 0]];
        }
        let values: Array1<f64> = x.column(1).to_owned();
        Ok(ModelOutput::PerEndpoint(vec![
            ScoreArray::Probabilities(probs),
            ScoreArray::Values(values),
        ]))
    })
}

#[test]
fn test_runner_with_jsonl_and_config() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let data_path = dir.path().join("test.jsonl");
    let mut data = std::fs::File::create(&data_path)?;
    writeln!(data, r#"{{"id": "m3", "labels": {{"active": 0, "logs": 3.0}}, "features": [0.2, 3.0]}}"#)?;
    writeln!(data, r#"{{"id": "m1", "labels": {{"active": 1, "logs": 1.0}}, "features": [0.9, 1.0]}}"#)?;
    writeln!(data, r#"{{"id": "m2", "labels": {{"active": -1, "logs": 2.0}}, "features": [0.5, 2.0]}}"#)?;
    writeln!(data, r#"{{"id": "m4", "labels": {{"active": 1, "logs": -1}}, "features": [0.7, 9.0]}}"#)?;

    let config_path = dir.path().join("eval.yaml");
    std::fs::write(
        &config_path,
        format!(
            "task_types:\n  active: classification\n  logs: regression\nconvention: keras\ndata:\n  path: {}\n",
            data_path.display()
        ),
    )?;

    let config = EvalConfig::from_path(&config_path)?;
    let eval = EvaluationBuilder::from_config(config).model(echo_model()).build()?;
    let report = eval.run()?;

    assert_eq!(report.results["active"].len(), 3);
    assert_eq!(report.results["logs"].y_true(), &array![1.0, 2.0, 3.0]);
    assert_abs_diff_eq!(report.auc["active"], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(report.r2["logs"], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(report.rms["logs"], 0.0, epsilon = 1e-12);
    assert_eq!(report.summary.classification, 1);
    assert_eq!(report.summary.regression, 1);

    assert_min_auc(&report, 0.9)?;
    assert_min_r2(&report, 0.9)?;
    assert_max_rms(&report, 0.1)?;

    let json: serde_json::Value = serde_json::from_str(&report.scores_json()?)?;
    assert_eq!(json["task_types"]["active"], "classification");
    assert!(json.get("results").is_none());
    Ok(())
}

#[test]
fn test_descriptor_endpoints_scored_as_regression() -> anyhow::Result<()> {
    let test_set: TestSet = [
        ("a", Sample::new([("t1", 1.0)]).with_descriptors(vec![10.0, 1.0])),
        ("b", Sample::new([("t1", 0.0)]).with_descriptors(vec![20.0, 2.0])),
        ("c", Sample::new([("t1", 1.0)]).with_descriptors(vec![30.0, 4.0])),
    ]
    .into_iter()
    .collect();
    let model = from_multi_head_fn(|_| {
        Ok(BTreeMap::from([
            ("task0".to_string(), ScoreArray::Probabilities(array![[0.2, 0.8], [0.6, 0.4], [0.3, 0.7]])),
            ("task1".to_string(), ScoreArray::Values(array![10.0, 20.0, 30.0])),
            ("task2".to_string(), ScoreArray::Values(array![1.0, 3.0, 4.0])),
        ]))
    });

    let report = Evaluation::builder()
        .data_source(Arc::new(InMemoryDataSource::new(test_set)))
        .model(model)
        .task_types(TaskTypes::from([("t1".to_string(), TaskType::Classification)]))
        .desc_transforms(DescriptorTransforms::from([
            ("0".to_string(), DescriptorTransform::Log),
            ("1".to_string(), DescriptorTransform::Normalize),
        ]))
        .convention(PredictionConvention::MultiHead)
        .add_descriptors(true)
        .build()?
        .run()?;

    assert_eq!(report.task_types["0"], TaskType::Regression);
    assert_abs_diff_eq!(report.rms["0"], 0.0, epsilon = 1e-12);
    // descriptor 1: one error of 1.0 over three samples
    assert_abs_diff_eq!(report.rms["1"], (1.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert!(report.auc.contains_key("t1"));
    assert!(!report.r2.contains_key("t1"));
    assert!(report.summary_table().contains("regression"));
    Ok(())
}

#[test]
fn test_failure_returns_no_partial_results() {
    let test_set: TestSet = [
        ("a", Sample::new([("good", 1.0), ("bad", 0.0)])),
        ("b", Sample::new([("good", 0.0), ("bad", 2.0)])),
    ]
    .into_iter()
    .collect();
    let model = from_proba_fn(|_| {
        Ok(ModelOutput::PerEndpoint(vec![
            ScoreArray::Probabilities(array![[0.5, 0.5], [0.5, 0.5]]),
            ScoreArray::Probabilities(array![[0.5, 0.5], [0.5, 0.5]]),
        ]))
    });
    let eval = Evaluation::builder()
        .data_source(Arc::new(InMemoryDataSource::new(test_set)))
        .model(model)
        .task_types(TaskTypes::from([
            ("good".to_string(), TaskType::Classification),
            ("bad".to_string(), TaskType::Classification),
        ]))
        .build()
        .unwrap();

    let err = eval.run().unwrap_err();
    let eval_err = err.downcast_ref::<EvalError>().unwrap();
    assert!(matches!(eval_err, EvalError::InvalidLabel { value, .. } if *value == 2.0));
}

#[test]
fn test_threshold_helpers_report_failures() {
    let model = from_proba_fn(|_| {
        Ok(ScoreArray::Probabilities(array![[0.9, 0.1], [0.2, 0.8], [0.5, 0.5]]).into())
    });
    let report = Evaluation::builder()
        .data_source(Arc::new(InMemoryDataSource::new(abc_test_set())))
        .model(model)
        .task_types(TaskTypes::from([("t1".to_string(), TaskType::Classification)]))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_abs_diff_eq!(report.auc["t1"], 0.0, epsilon = 1e-12);
    let err = assert_min_auc(&report, 0.5).unwrap_err();
    assert!(err.to_string().contains("below threshold"));
}

#[test]
fn test_builder_requires_model() {
    let err = Evaluation::builder()
        .data_source(Arc::new(InMemoryDataSource::new(abc_test_set())))
        .task_types(TaskTypes::new())
        .build()
        .err()
        .unwrap();
    assert!(err.to_string().contains("model must be set"));
}
