use std::collections::BTreeMap;

use assayeval_types::{EndpointResult, Result, ResultsMap, TaskType};
use smartcore::metrics::mean_squared_error;

use crate::aggregator::Aggregator;
use crate::aggregators::r2::regression_pair;

/// Root of the mean squared error for regression endpoints.
pub struct RmsAggregator;

impl Aggregator for RmsAggregator {
    fn name(&self) -> &'static str {
        "rms"
    }

    fn task_type(&self) -> TaskType {
        TaskType::Regression
    }

    fn score(&self, endpoint: &str, result: &EndpointResult) -> Result<f64> {
        let (y_true, y_pred) = regression_pair(endpoint, result)?;
        Ok(mean_squared_error(&y_true, &y_pred).sqrt())
    }
}

pub fn compute_rms_scores(
    results: &ResultsMap,
    task_types: &BTreeMap<String, TaskType>,
) -> Result<BTreeMap<String, f64>> {
    RmsAggregator.aggregate(results, task_types)
}
