use thiserror::Error;

/// Errors raised while aligning predictions or computing scores.
///
/// Every variant is a deterministic function of the inputs; nothing here is
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),

	#[error("Invalid label {value} for sample '{sample}' on '{endpoint}': labels must be 0/1")]
	InvalidLabel { sample: String, endpoint: String, value: f64 },

	#[error("Sample '{sample}' has no label for task '{endpoint}'")]
	MissingLabel { sample: String, endpoint: String },

	#[error("Sample '{sample}' has no descriptor at index {index}")]
	MissingDescriptor { sample: String, index: usize },

	#[error("Prediction shape mismatch for '{endpoint}': {reason}")]
	PredictionShape { endpoint: String, reason: String },

	#[error("{metric} is undefined for '{endpoint}': {reason}")]
	UndefinedMetric { metric: &'static str, endpoint: String, reason: String },

	/// Returned by `Model` implementations whose own prediction call fails.
	#[error("Model prediction failed: {0}")]
	Model(String),
}

pub type Result<T, E = EvalError> = std::result::Result<T, E>;
