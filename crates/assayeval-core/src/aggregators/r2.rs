use std::collections::BTreeMap;

use assayeval_types::{EndpointResult, EvalError, Result, ResultsMap, TaskType};
use smartcore::metrics::r2;

use crate::aggregator::Aggregator;

/// Coefficient of determination for regression endpoints.
pub struct R2Aggregator;

impl Aggregator for R2Aggregator {
    fn name(&self) -> &'static str {
        "r2"
    }

    fn task_type(&self) -> TaskType {
        TaskType::Regression
    }

    fn score(&self, endpoint: &str, result: &EndpointResult) -> Result<f64> {
        let (y_true, y_pred) = regression_pair(endpoint, result)?;
        let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
        let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
        if ss_tot == 0.0 {
            // constant ground truth: only a perfect fit explains it
            let exact = y_true.iter().zip(&y_pred).all(|(t, p)| t == p);
            return Ok(if exact { 1.0 } else { 0.0 });
        }
        Ok(r2(&y_true, &y_pred))
    }
}

/// R² for every regression endpoint.
pub fn compute_r2_scores(
    results: &ResultsMap,
    task_types: &BTreeMap<String, TaskType>,
) -> Result<BTreeMap<String, f64>> {
    R2Aggregator.aggregate(results, task_types)
}

/// Ground truth and predicted values as plain vectors for smartcore.
pub(crate) fn regression_pair(
    endpoint: &str,
    result: &EndpointResult,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let y_pred = result
        .y_score()
        .values()
        .ok_or_else(|| EvalError::PredictionShape {
            endpoint: endpoint.to_string(),
            reason: "expected one predicted value per sample".to_string(),
        })?;
    Ok((result.y_true().to_vec(), y_pred.to_vec()))
}
