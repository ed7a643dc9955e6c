//! Shared data model for assayeval: test sets, task types, the aligned
//! results map and the score report.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

mod error;

pub use error::{EvalError, Result};

/// Label value meaning "no ground truth for this sample/task pair".
pub const MISSING_LABEL: f64 = -1.0;

/// One row of the held-out set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
	pub labels: HashMap<String, f64>,
	/// Auxiliary regression targets, indexed positionally.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub descriptors: Vec<f64>,
	/// Model input produced by the upstream featurizer.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub features: Vec<f64>,
}

impl Sample {
	pub fn new<I, K>(labels: I) -> Self
	where
		I: IntoIterator<Item = (K, f64)>,
		K: Into<String>,
	{
		Self {
			labels: labels.into_iter().map(|(k, v)| (k.into(), v)).collect(),
			descriptors: Vec::new(),
			features: Vec::new(),
		}
	}

	pub fn with_descriptors(mut self, descriptors: Vec<f64>) -> Self {
		self.descriptors = descriptors;
		self
	}

	pub fn with_features(mut self, features: Vec<f64>) -> Self {
		self.features = features;
		self
	}
}

/// Held-out samples keyed by identifier (e.g. a SMILES string).
///
/// The backing map has no meaningful order. Anything that needs positions
/// goes through [`TestSet::iter_sorted`], which is the order prediction rows
/// are aligned to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestSet {
	samples: HashMap<String, Sample>,
}

impl TestSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: impl Into<String>, sample: Sample) -> Option<Sample> {
		self.samples.insert(id.into(), sample)
	}

	pub fn get(&self, id: &str) -> Option<&Sample> {
		self.samples.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.samples.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.samples.len()
	}

	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}

	/// Sample identifiers in lexicographic order.
	pub fn sorted_ids(&self) -> Vec<&str> {
		let mut ids: Vec<&str> = self.samples.keys().map(String::as_str).collect();
		ids.sort_unstable();
		ids
	}

	/// Samples in canonical (lexicographic identifier) order.
	pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &Sample)> + '_ {
		let mut entries: Vec<(&str, &Sample)> =
			self.samples.iter().map(|(id, s)| (id.as_str(), s)).collect();
		entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
		entries.into_iter()
	}
}

impl<K: Into<String>> FromIterator<(K, Sample)> for TestSet {
	fn from_iter<T: IntoIterator<Item = (K, Sample)>>(iter: T) -> Self {
		Self {
			samples: iter.into_iter().map(|(k, s)| (k.into(), s)).collect(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskType {
	Classification,
	Regression,
}

impl TaskType {
	pub fn as_str(&self) -> &'static str {
		match self {
			TaskType::Classification => "classification",
			TaskType::Regression => "regression",
		}
	}
}

impl fmt::Display for TaskType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TaskType {
	type Err = EvalError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"classification" => Ok(TaskType::Classification),
			"regression" => Ok(TaskType::Regression),
			other => Err(EvalError::InvalidConfiguration(format!(
				"task_type must be classification or regression, got '{other}'"
			))),
		}
	}
}

impl TryFrom<String> for TaskType {
	type Error = EvalError;

	fn try_from(s: String) -> Result<Self> {
		s.parse()
	}
}

impl From<TaskType> for String {
	fn from(t: TaskType) -> Self {
		t.as_str().to_string()
	}
}

pub type TaskTypes = HashMap<String, TaskType>;

/// Transform recorded for a descriptor column. Only the set of keys matters
/// during evaluation; the transform itself is applied upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub enum DescriptorTransform {
	#[default]
	None,
	Log,
	Normalize,
	LogNormalize,
}

impl FromStr for DescriptorTransform {
	type Err = EvalError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"none" => Ok(DescriptorTransform::None),
			"log" => Ok(DescriptorTransform::Log),
			"normalize" => Ok(DescriptorTransform::Normalize),
			"log-normalize" => Ok(DescriptorTransform::LogNormalize),
			other => Err(EvalError::InvalidConfiguration(format!(
				"descriptor transform must be none, log, normalize or log-normalize, got '{other}'"
			))),
		}
	}
}

impl TryFrom<Option<String>> for DescriptorTransform {
	type Error = EvalError;

	fn try_from(s: Option<String>) -> Result<Self> {
		match s {
			None => Ok(DescriptorTransform::None),
			Some(s) => s.parse(),
		}
	}
}

impl From<DescriptorTransform> for Option<String> {
	fn from(t: DescriptorTransform) -> Self {
		match t {
			DescriptorTransform::None => None,
			DescriptorTransform::Log => Some("log".to_string()),
			DescriptorTransform::Normalize => Some("normalize".to_string()),
			DescriptorTransform::LogNormalize => Some("log-normalize".to_string()),
		}
	}
}

/// Descriptor transforms keyed by the decimal descriptor index.
pub type DescriptorTransforms = HashMap<String, DescriptorTransform>;

/// Per-sample scores for one endpoint.
///
/// Classification endpoints carry an `n x 2` class-probability matrix,
/// regression endpoints a vector of predicted values.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreArray {
	Probabilities(Array2<f64>),
	Values(Array1<f64>),
}

impl ScoreArray {
	/// Number of samples (rows).
	pub fn len(&self) -> usize {
		match self {
			ScoreArray::Probabilities(m) => m.nrows(),
			ScoreArray::Values(v) => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Probability of class 1, when this holds a two-column matrix.
	pub fn positive_class(&self) -> Option<ArrayView1<'_, f64>> {
		match self {
			ScoreArray::Probabilities(m) if m.ncols() == 2 => Some(m.column(1)),
			_ => None,
		}
	}

	pub fn values(&self) -> Option<ArrayView1<'_, f64>> {
		match self {
			ScoreArray::Values(v) => Some(v.view()),
			ScoreArray::Probabilities(_) => None,
		}
	}

	/// Copy out the given rows, in the given order.
	pub fn select(&self, rows: &[usize]) -> ScoreArray {
		match self {
			ScoreArray::Probabilities(m) => ScoreArray::Probabilities(m.select(Axis(0), rows)),
			ScoreArray::Values(v) => ScoreArray::Values(v.select(Axis(0), rows)),
		}
	}
}

/// Aligned ground truth and predictions for one endpoint. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResult {
	y_true: Array1<f64>,
	y_score: ScoreArray,
}

impl EndpointResult {
	pub fn new(y_true: Array1<f64>, y_score: ScoreArray) -> Result<Self> {
		if y_true.len() != y_score.len() {
			return Err(EvalError::PredictionShape {
				endpoint: "-".to_string(),
				reason: format!(
					"{} ground-truth values but {} predictions",
					y_true.len(),
					y_score.len()
				),
			});
		}
		Ok(Self { y_true, y_score })
	}

	pub fn y_true(&self) -> &Array1<f64> {
		&self.y_true
	}

	pub fn y_score(&self) -> &ScoreArray {
		&self.y_score
	}

	pub fn len(&self) -> usize {
		self.y_true.len()
	}

	pub fn is_empty(&self) -> bool {
		self.y_true.is_empty()
	}
}

/// Endpoint name to aligned (ground truth, predictions).
pub type ResultsMap = BTreeMap<String, EndpointResult>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
	pub endpoints: usize,
	pub classification: usize,
	pub regression: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mean_auc: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mean_r2: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mean_rms: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
	#[serde(skip)]
	pub results: ResultsMap,
	pub task_types: BTreeMap<String, TaskType>,
	pub auc: BTreeMap<String, f64>,
	pub r2: BTreeMap<String, f64>,
	pub rms: BTreeMap<String, f64>,
	pub summary: EvalSummary,
}

#[derive(Debug, Clone, Tabled)]
struct EndpointRow {
	endpoint: String,
	task_type: String,
	n: usize,
	auc: String,
	r2: String,
	rms: String,
}

impl EvalReport {
	pub fn new(
		results: ResultsMap,
		task_types: BTreeMap<String, TaskType>,
		auc: BTreeMap<String, f64>,
		r2: BTreeMap<String, f64>,
		rms: BTreeMap<String, f64>,
	) -> Self {
		let summary = Self::summarize(&task_types, &auc, &r2, &rms);
		Self { results, task_types, auc, r2, rms, summary }
	}

	pub fn summarize(
		task_types: &BTreeMap<String, TaskType>,
		auc: &BTreeMap<String, f64>,
		r2: &BTreeMap<String, f64>,
		rms: &BTreeMap<String, f64>,
	) -> EvalSummary {
		let classification = task_types
			.values()
			.filter(|t| **t == TaskType::Classification)
			.count();

		EvalSummary {
			endpoints: task_types.len(),
			classification,
			regression: task_types.len() - classification,
			mean_auc: mean(auc),
			mean_r2: mean(r2),
			mean_rms: mean(rms),
		}
	}

	pub fn summary_table(&self) -> String {
		let rows: Vec<EndpointRow> = self
			.task_types
			.iter()
			.map(|(endpoint, task_type)| EndpointRow {
				endpoint: endpoint.clone(),
				task_type: task_type.to_string(),
				n: self.results.get(endpoint).map(|r| r.len()).unwrap_or(0),
				auc: fmt_score(self.auc.get(endpoint)),
				r2: fmt_score(self.r2.get(endpoint)),
				rms: fmt_score(self.rms.get(endpoint)),
			})
			.collect();

		let table_str = Table::new(rows).to_string();

		let summary_text = format!(
			"Endpoints: {}  Classification: {}  Regression: {}  Mean AUC: {}  Mean R²: {}  Mean RMS: {}",
			self.summary.endpoints,
			self.summary.classification,
			self.summary.regression,
			fmt_score(self.summary.mean_auc.as_ref()),
			fmt_score(self.summary.mean_r2.as_ref()),
			fmt_score(self.summary.mean_rms.as_ref()),
		);

		format!("{}\n\n{}\n", table_str, summary_text)
	}

	/// Score maps and summary as pretty-printed JSON.
	pub fn scores_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}

fn mean(scores: &BTreeMap<String, f64>) -> Option<f64> {
	if scores.is_empty() {
		return None;
	}
	Some(scores.values().sum::<f64>() / scores.len() as f64)
}

fn fmt_score(score: Option<&f64>) -> String {
	match score {
		Some(v) => format!("{:.3}", v),
		None => "-".to_string(),
	}
}
