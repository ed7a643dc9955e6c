use assayeval_types::{
    DescriptorTransforms, EndpointResult, EvalError, Result, ResultsMap, Sample, ScoreArray,
    TaskType, TaskTypes, TestSet, MISSING_LABEL,
};
use ndarray::Array1;
use tracing::{debug, info};

use crate::adapter::model_predictions;
use crate::endpoint::{Endpoint, EndpointList};
use crate::model::{Model, PredictionConvention};

/// Ground truth and kept prediction rows for one endpoint, filled during the
/// pass over the test set and frozen into an [`EndpointResult`] at the end.
struct Accumulator {
    y_true: Vec<f64>,
    rows: Vec<usize>,
    skipped: usize,
}

impl Accumulator {
    fn new(capacity: usize) -> Self {
        Self {
            y_true: Vec::with_capacity(capacity),
            rows: Vec::with_capacity(capacity),
            skipped: 0,
        }
    }

    fn freeze(self, scores: &ScoreArray) -> Result<EndpointResult> {
        EndpointResult::new(Array1::from(self.y_true), scores.select(&self.rows))
    }
}

/// Evaluates `model` on `test_set`, pairing each endpoint's true values with
/// the model's predictions.
///
/// Samples are visited in lexicographic identifier order, the same order the
/// prediction rows are produced in. A primary-task label of `-1` drops that
/// (sample, endpoint) pair. Any error aborts the whole pass.
pub fn eval_model(
    test_set: &TestSet,
    model: &dyn Model,
    task_types: &TaskTypes,
    desc_transforms: &DescriptorTransforms,
    convention: PredictionConvention,
    add_descriptors: bool,
) -> Result<ResultsMap> {
    let endpoints = EndpointList::new(task_types, desc_transforms, add_descriptors)?;
    let raw = model_predictions(
        test_set,
        model,
        endpoints.n_targets(),
        desc_transforms.len(),
        add_descriptors,
        convention,
    )?;
    let predictions = endpoints
        .iter()
        .zip(raw)
        .map(|(endpoint, scores)| conform(endpoint, endpoints.task_type(endpoint), scores))
        .collect::<Result<Vec<_>>>()?;

    let mut accumulators: Vec<Accumulator> = endpoints
        .iter()
        .map(|_| Accumulator::new(test_set.len()))
        .collect();

    for (row, (id, sample)) in test_set.iter_sorted().enumerate() {
        for (endpoint, acc) in endpoints.iter().zip(accumulators.iter_mut()) {
            match ground_truth(id, sample, endpoint, endpoints.task_type(endpoint))? {
                Some(value) => {
                    acc.y_true.push(value);
                    acc.rows.push(row);
                }
                None => acc.skipped += 1,
            }
        }
    }

    let mut results = ResultsMap::new();
    for ((endpoint, acc), scores) in endpoints.iter().zip(accumulators).zip(&predictions) {
        debug!(
            endpoint = endpoint.name(),
            kept = acc.rows.len(),
            skipped = acc.skipped,
            "aligned endpoint"
        );
        results.insert(endpoint.name().to_string(), acc.freeze(scores)?);
    }

    info!(
        samples = test_set.len(),
        endpoints = endpoints.len(),
        "evaluated model on test set"
    );
    Ok(results)
}

/// The true value a sample contributes to an endpoint, or `None` when the
/// label is the missing sentinel.
fn ground_truth(
    id: &str,
    sample: &Sample,
    endpoint: &Endpoint,
    task_type: TaskType,
) -> Result<Option<f64>> {
    match endpoint {
        Endpoint::Task(name) => {
            let label = *sample
                .labels
                .get(name)
                .ok_or_else(|| EvalError::MissingLabel {
                    sample: id.to_string(),
                    endpoint: name.clone(),
                })?;
            if label == MISSING_LABEL {
                return Ok(None);
            }
            match task_type {
                TaskType::Classification if label == 0.0 || label == 1.0 => Ok(Some(label)),
                TaskType::Classification => Err(EvalError::InvalidLabel {
                    sample: id.to_string(),
                    endpoint: name.clone(),
                    value: label,
                }),
                TaskType::Regression => Ok(Some(label)),
            }
        }
        Endpoint::Descriptor { index, .. } => sample
            .descriptors
            .get(*index)
            .copied()
            .map(Some)
            .ok_or_else(|| EvalError::MissingDescriptor {
                sample: id.to_string(),
                index: *index,
            }),
    }
}

/// Check a prediction array fits its endpoint's task type. Single-column
/// matrices on regression endpoints are flattened to values.
fn conform(endpoint: &Endpoint, task_type: TaskType, scores: ScoreArray) -> Result<ScoreArray> {
    let mismatch = |reason: String| EvalError::PredictionShape {
        endpoint: endpoint.name().to_string(),
        reason,
    };
    match (task_type, scores) {
        (TaskType::Classification, ScoreArray::Probabilities(m)) if m.ncols() == 2 => {
            Ok(ScoreArray::Probabilities(m))
        }
        (TaskType::Classification, ScoreArray::Probabilities(m)) => Err(mismatch(format!(
            "classification needs 2 class-probability columns, got {}",
            m.ncols()
        ))),
        (TaskType::Classification, ScoreArray::Values(_)) => Err(mismatch(
            "classification needs class probabilities, got scalar values".to_string(),
        )),
        (TaskType::Regression, ScoreArray::Values(v)) => Ok(ScoreArray::Values(v)),
        (TaskType::Regression, ScoreArray::Probabilities(m)) if m.ncols() == 1 => {
            Ok(ScoreArray::Values(m.column(0).to_owned()))
        }
        (TaskType::Regression, ScoreArray::Probabilities(m)) => Err(mismatch(format!(
            "regression needs one value per sample, got {} columns",
            m.ncols()
        ))),
    }
}
