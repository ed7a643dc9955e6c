use std::collections::BTreeMap;

use assayeval_types::{EvalError, Result, ScoreArray, TestSet};
use ndarray::Array2;
use tracing::debug;

use crate::model::{Model, PredictionConvention};

/// Input key multi-head models are called with.
pub const MULTI_HEAD_INPUT: &str = "input";

/// Name of the output block holding endpoint `index` in a multi-head model.
pub fn head_name(index: usize) -> String {
    format!("task{index}")
}

/// Stack sample features into a matrix, one row per sample in canonical order.
pub fn feature_matrix(test_set: &TestSet) -> Result<Array2<f64>> {
    let width = test_set
        .iter_sorted()
        .next()
        .map(|(_, s)| s.features.len())
        .unwrap_or(0);

    let mut data = Vec::with_capacity(test_set.len() * width);
    for (id, sample) in test_set.iter_sorted() {
        if sample.features.len() != width {
            return Err(EvalError::InvalidConfiguration(format!(
                "sample '{id}' has {} features, expected {width}",
                sample.features.len()
            )));
        }
        data.extend_from_slice(&sample.features);
    }

    Array2::from_shape_vec((test_set.len(), width), data)
        .map_err(|e| EvalError::InvalidConfiguration(e.to_string()))
}

/// Runs the model over the test set and returns one prediction array per
/// endpoint, each with one row per sample in canonical order.
///
/// Single-output models come back as a one-element sequence.
pub fn model_predictions(
    test_set: &TestSet,
    model: &dyn Model,
    n_targets: usize,
    n_descriptors: usize,
    add_descriptors: bool,
    convention: PredictionConvention,
) -> Result<Vec<ScoreArray>> {
    let features = feature_matrix(test_set)?;
    let n_outputs = if add_descriptors {
        n_targets + n_descriptors
    } else {
        n_targets
    };

    let predictions = match convention {
        PredictionConvention::Probability => model.predict_proba(features.view())?.into_endpoints(),
        PredictionConvention::Direct => model.predict(features.view())?.into_endpoints(),
        PredictionConvention::MultiHead => {
            let inputs = BTreeMap::from([(MULTI_HEAD_INPUT.to_string(), features.view())]);
            let mut heads = model.predict_named(&inputs)?;
            (0..n_outputs)
                .map(|index| {
                    let name = head_name(index);
                    heads.remove(&name).ok_or_else(|| EvalError::PredictionShape {
                        endpoint: name,
                        reason: "model returned no output block".to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?
        }
    };

    if predictions.len() != n_outputs {
        return Err(EvalError::PredictionShape {
            endpoint: "*".to_string(),
            reason: format!(
                "expected {n_outputs} endpoint outputs, model returned {}",
                predictions.len()
            ),
        });
    }
    for (index, scores) in predictions.iter().enumerate() {
        if scores.len() != test_set.len() {
            return Err(EvalError::PredictionShape {
                endpoint: format!("output {index}"),
                reason: format!(
                    "{} rows for {} samples",
                    scores.len(),
                    test_set.len()
                ),
            });
        }
    }

    debug!(
        convention = %convention,
        samples = test_set.len(),
        outputs = n_outputs,
        "collected model predictions"
    );
    Ok(predictions)
}
