use std::sync::Arc;

use anyhow::Result;
use assayeval_types::{DescriptorTransforms, EvalReport, TaskTypes, TestSet};

use crate::aggregators::{auc::compute_roc_auc_scores, r2::compute_r2_scores, rms::compute_rms_scores};
use crate::aligner::eval_model;
use crate::config::EvalConfig;
use crate::datasource::{DataSource, JsonlDataSource};
use crate::endpoint::endpoint_task_types;
use crate::model::{Model, PredictionConvention};

pub struct EvaluationBuilder {
	data_source: Option<Arc<dyn DataSource>>,
	model: Option<Arc<dyn Model>>,
	task_types: Option<TaskTypes>,
	desc_transforms: DescriptorTransforms,
	convention: PredictionConvention,
	add_descriptors: bool,
}

impl EvaluationBuilder {
	pub fn new() -> Self {
		Self {
			data_source: None,
			model: None,
			task_types: None,
			desc_transforms: DescriptorTransforms::new(),
			convention: PredictionConvention::default(),
			add_descriptors: false,
		}
	}

	/// Take task types, descriptors and convention from a config. A `data`
	/// section becomes a JSONL data source.
	pub fn from_config(config: EvalConfig) -> Self {
		let mut builder = Self::new()
			.task_types(config.task_types)
			.desc_transforms(config.desc_transforms)
			.convention(config.convention)
			.add_descriptors(config.add_descriptors);
		if let Some(data) = config.data {
			builder = builder.data_source(Arc::new(JsonlDataSource::new(data.path)));
		}
		builder
	}

	pub fn data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
		self.data_source = Some(data_source);
		self
	}

	pub fn model(mut self, model: Arc<dyn Model>) -> Self {
		self.model = Some(model);
		self
	}

	pub fn task_types(mut self, task_types: TaskTypes) -> Self {
		self.task_types = Some(task_types);
		self
	}

	pub fn desc_transforms(mut self, desc_transforms: DescriptorTransforms) -> Self {
		self.desc_transforms = desc_transforms;
		self
	}

	pub fn convention(mut self, convention: PredictionConvention) -> Self {
		self.convention = convention;
		self
	}

	pub fn add_descriptors(mut self, add_descriptors: bool) -> Self {
		self.add_descriptors = add_descriptors;
		self
	}

	pub fn build(self) -> Result<Evaluation> {
		Ok(Evaluation {
			data_source: self.data_source.ok_or_else(|| anyhow::anyhow!("data_source must be set"))?,
			model: self.model.ok_or_else(|| anyhow::anyhow!("model must be set"))?,
			task_types: self.task_types.ok_or_else(|| anyhow::anyhow!("task_types must be set"))?,
			desc_transforms: self.desc_transforms,
			convention: self.convention,
			add_descriptors: self.add_descriptors,
		})
	}
}

impl Default for EvaluationBuilder {
	fn default() -> Self {
		Self::new()
	}
}

pub struct Evaluation {
	data_source: Arc<dyn DataSource>,
	model: Arc<dyn Model>,
	task_types: TaskTypes,
	desc_transforms: DescriptorTransforms,
	convention: PredictionConvention,
	add_descriptors: bool,
}

impl Evaluation {
	pub fn builder() -> EvaluationBuilder {
		EvaluationBuilder::new()
	}

	pub fn run(&self) -> Result<EvalReport> {
		let test_set = self.data_source.load()?;
		Ok(self.run_on(&test_set)?)
	}

	/// Align and score against an already loaded test set.
	pub fn run_on(&self, test_set: &TestSet) -> assayeval_types::Result<EvalReport> {
		let results = eval_model(
			test_set,
			self.model.as_ref(),
			&self.task_types,
			&self.desc_transforms,
			self.convention,
			self.add_descriptors,
		)?;
		let task_types = endpoint_task_types(&self.task_types, &self.desc_transforms, self.add_descriptors)?;

		let auc = compute_roc_auc_scores(&results, &task_types)?;
		let r2 = compute_r2_scores(&results, &task_types)?;
		let rms = compute_rms_scores(&results, &task_types)?;

		Ok(EvalReport::new(results, task_types, auc, r2, rms))
	}
}
