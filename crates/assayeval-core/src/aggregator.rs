use std::collections::BTreeMap;

use assayeval_types::{EndpointResult, EvalError, Result, ResultsMap, TaskType};
use tracing::info;

/// Reduces each endpoint of a results map to one scalar.
///
/// Only endpoints whose task type matches [`Aggregator::task_type`] are
/// scored. Every endpoint in the results must appear in the task type map;
/// descriptor endpoints are covered by [`crate::endpoint_task_types`].
pub trait Aggregator {
    fn name(&self) -> &'static str;

    fn task_type(&self) -> TaskType;

    fn score(&self, endpoint: &str, result: &EndpointResult) -> Result<f64>;

    fn aggregate(
        &self,
        results: &ResultsMap,
        task_types: &BTreeMap<String, TaskType>,
    ) -> Result<BTreeMap<String, f64>> {
        let mut scores = BTreeMap::new();
        for (endpoint, result) in results {
            let task_type = task_types.get(endpoint).ok_or_else(|| {
                EvalError::InvalidConfiguration(format!(
                    "endpoint '{endpoint}' has no task type"
                ))
            })?;
            if *task_type != self.task_type() {
                continue;
            }
            if result.is_empty() {
                return Err(EvalError::UndefinedMetric {
                    metric: self.name(),
                    endpoint: endpoint.clone(),
                    reason: "no labelled samples".to_string(),
                });
            }
            let score = self.score(endpoint, result)?;
            info!(endpoint = %endpoint, metric = self.name(), score, "scored endpoint");
            scores.insert(endpoint.clone(), score);
        }
        Ok(scores)
    }
}
