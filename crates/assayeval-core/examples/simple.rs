use std::sync::Arc;

use assayeval_core::{
    from_proba_fn, Evaluation, InMemoryDataSource, JsonlDataSource, Sample, ScoreArray, TaskType,
    TaskTypes, TestSet,
};
use ndarray::Array2;

fn main() -> anyhow::Result<()> {
    // Example 1: Inline test set
    let test_set: TestSet = [
        ("CCO", Sample::new([("tox", 0.0)]).with_features(vec![0.1])),
        ("CC(=O)O", Sample::new([("tox", 1.0)]).with_features(vec![0.9])),
        ("c1ccccc1", Sample::new([("tox", -1.0)]).with_features(vec![0.4])),
    ]
    .into_iter()
    .collect();
    let task_types = TaskTypes::from([("tox".to_string(), TaskType::Classification)]);

    // Model: the single feature is the probability of class 1
    let model = from_proba_fn(|x| {
        let mut probs = Array2::zeros((x.nrows(), 2));
        for (i, p) in x.column(0).iter().enumerate() {
            probs[[i, 0]] = 1.0 - p;
            probs[[i, 1]] = *p;
        }
        Ok(ScoreArray::Probabilities(probs).into())
    });

    let eval = Evaluation::builder()
        .data_source(Arc::new(InMemoryDataSource::new(test_set)))
        .model(model.clone())
        .task_types(task_types.clone())
        .build()?;

    let report = eval.run()?;
    println!("{}", report.summary_table());

    // Example 2: Load from JSONL file if provided
    if let Some(path) = std::env::args().nth(1) {
        let eval = Evaluation::builder()
            .data_source(Arc::new(JsonlDataSource::new(path)))
            .model(model)
            .task_types(task_types)
            .build()?;
        let report = eval.run()?;
        println!("{}", report.summary_table());
    }

    Ok(())
}
