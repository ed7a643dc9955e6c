use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use assayeval_types::{EvalError, Result, ScoreArray};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Which prediction entry point a model exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PredictionConvention {
	/// One `predict_proba` call over the whole feature matrix.
	#[default]
	Probability,
	/// One `predict` call over the whole feature matrix.
	Direct,
	/// One keyed `predict` call returning an output block per endpoint.
	MultiHead,
}

impl PredictionConvention {
	pub fn as_str(&self) -> &'static str {
		match self {
			PredictionConvention::Probability => "probability",
			PredictionConvention::Direct => "direct",
			PredictionConvention::MultiHead => "multi_head",
		}
	}
}

impl fmt::Display for PredictionConvention {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PredictionConvention {
	type Err = EvalError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"probability" | "sklearn" => Ok(PredictionConvention::Probability),
			"direct" | "keras" => Ok(PredictionConvention::Direct),
			"multi_head" | "keras_multitask" => Ok(PredictionConvention::MultiHead),
			other => Err(EvalError::InvalidConfiguration(format!(
				"Improper prediction convention '{other}'"
			))),
		}
	}
}

impl TryFrom<String> for PredictionConvention {
	type Error = EvalError;

	fn try_from(s: String) -> Result<Self> {
		s.parse()
	}
}

impl From<PredictionConvention> for String {
	fn from(c: PredictionConvention) -> Self {
		c.as_str().to_string()
	}
}

/// What a single-call model returns: one array when it has one endpoint,
/// otherwise one array per endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
	Single(ScoreArray),
	PerEndpoint(Vec<ScoreArray>),
}

impl ModelOutput {
	pub fn into_endpoints(self) -> Vec<ScoreArray> {
		match self {
			ModelOutput::Single(scores) => vec![scores],
			ModelOutput::PerEndpoint(scores) => scores,
		}
	}
}

impl From<ScoreArray> for ModelOutput {
	fn from(scores: ScoreArray) -> Self {
		ModelOutput::Single(scores)
	}
}

impl From<Vec<ScoreArray>> for ModelOutput {
	fn from(scores: Vec<ScoreArray>) -> Self {
		ModelOutput::PerEndpoint(scores)
	}
}

/// A trained model, seen only through its prediction entry points.
///
/// Implement the entry point matching the model's [`PredictionConvention`];
/// the others fail with [`EvalError::InvalidConfiguration`]. A model whose
/// own prediction call fails reports it as [`EvalError::Model`].
pub trait Model: Send + Sync {
	fn predict_proba(&self, _features: ArrayView2<'_, f64>) -> Result<ModelOutput> {
		Err(unsupported(PredictionConvention::Probability))
	}

	fn predict(&self, _features: ArrayView2<'_, f64>) -> Result<ModelOutput> {
		Err(unsupported(PredictionConvention::Direct))
	}

	/// Keyed inputs in, named output blocks out.
	fn predict_named(
		&self,
		_inputs: &BTreeMap<String, ArrayView2<'_, f64>>,
	) -> Result<BTreeMap<String, ScoreArray>> {
		Err(unsupported(PredictionConvention::MultiHead))
	}
}

fn unsupported(convention: PredictionConvention) -> EvalError {
	EvalError::InvalidConfiguration(format!(
		"model does not support the {convention} prediction convention"
	))
}

/// Wrap a closure as a [`PredictionConvention::Probability`] model.
pub fn from_proba_fn<F>(f: F) -> Arc<dyn Model>
where
	F: Fn(ArrayView2<'_, f64>) -> Result<ModelOutput> + Send + Sync + 'static,
{
	struct ProbaFn<F> {
		f: F,
	}

	impl<F> Model for ProbaFn<F>
	where
		F: Fn(ArrayView2<'_, f64>) -> Result<ModelOutput> + Send + Sync + 'static,
	{
		fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<ModelOutput> {
			(self.f)(features)
		}
	}

	Arc::new(ProbaFn { f })
}

/// Wrap a closure as a [`PredictionConvention::Direct`] model.
pub fn from_predict_fn<F>(f: F) -> Arc<dyn Model>
where
	F: Fn(ArrayView2<'_, f64>) -> Result<ModelOutput> + Send + Sync + 'static,
{
	struct PredictFn<F> {
		f: F,
	}

	impl<F> Model for PredictFn<F>
	where
		F: Fn(ArrayView2<'_, f64>) -> Result<ModelOutput> + Send + Sync + 'static,
	{
		fn predict(&self, features: ArrayView2<'_, f64>) -> Result<ModelOutput> {
			(self.f)(features)
		}
	}

	Arc::new(PredictFn { f })
}

/// Wrap a closure as a [`PredictionConvention::MultiHead`] model.
pub fn from_multi_head_fn<F>(f: F) -> Arc<dyn Model>
where
	F: Fn(&BTreeMap<String, ArrayView2<'_, f64>>) -> Result<BTreeMap<String, ScoreArray>>
		+ Send
		+ Sync
		+ 'static,
{
	struct MultiHeadFn<F> {
		f: F,
	}

	impl<F> Model for MultiHeadFn<F>
	where
		F: Fn(&BTreeMap<String, ArrayView2<'_, f64>>) -> Result<BTreeMap<String, ScoreArray>>
			+ Send
			+ Sync
			+ 'static,
	{
		fn predict_named(
			&self,
			inputs: &BTreeMap<String, ArrayView2<'_, f64>>,
		) -> Result<BTreeMap<String, ScoreArray>> {
			(self.f)(inputs)
		}
	}

	Arc::new(MultiHeadFn { f })
}

#[cfg(test)]
mod tests {
	use super::*;
	use ndarray::{array, Array2};

	#[test]
	fn test_convention_aliases() {
		assert_eq!("sklearn".parse::<PredictionConvention>().unwrap(), PredictionConvention::Probability);
		assert_eq!("keras".parse::<PredictionConvention>().unwrap(), PredictionConvention::Direct);
		assert_eq!(
			"keras_multitask".parse::<PredictionConvention>().unwrap(),
			PredictionConvention::MultiHead
		);
	}

	#[test]
	fn test_unknown_convention_is_invalid_configuration() {
		let err = "xgboost".parse::<PredictionConvention>().unwrap_err();
		assert!(matches!(err, EvalError::InvalidConfiguration(_)));
	}

	#[test]
	fn test_single_output_becomes_one_element_sequence() {
		let out = ModelOutput::from(ScoreArray::Values(array![1.0, 2.0]));
		assert_eq!(out.into_endpoints().len(), 1);
	}

	#[test]
	fn test_unimplemented_entry_point_fails() {
		let model = from_proba_fn(|x| Ok(ScoreArray::Values(x.column(0).to_owned()).into()));
		let x = Array2::<f64>::zeros((2, 1));
		assert!(model.predict_proba(x.view()).is_ok());
		let err = model.predict(x.view()).unwrap_err();
		assert!(matches!(err, EvalError::InvalidConfiguration(_)));
	}
}
