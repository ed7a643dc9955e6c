//! assayeval-core: score trained models on a held-out test set.
//! Align per-task labels with model predictions, then reduce each endpoint to
//! ROC-AUC, R² or RMS error. See `examples/simple.rs` for a quickstart.

pub mod adapter;
pub mod aggregator;
pub mod aligner;
pub mod config;
pub mod datasource;
pub mod endpoint;
pub mod model;
pub mod runner;
pub mod testing;

pub mod aggregators {
    pub mod auc;
    pub mod r2;
    pub mod rms;
}

pub use adapter::{feature_matrix, model_predictions};
pub use aggregator::Aggregator;
pub use aggregators::{
    auc::{compute_roc_auc_scores, labels_to_weights, roc_curve, RocAucAggregator, RocCurve, RocPoint},
    r2::{compute_r2_scores, R2Aggregator},
    rms::{compute_rms_scores, RmsAggregator},
};
pub use aligner::eval_model;
pub use config::{DataConfig, EvalConfig};
pub use datasource::{DataSource, InMemoryDataSource, JsonlDataSource};
pub use endpoint::{endpoint_task_types, Endpoint, EndpointList};
pub use model::{from_multi_head_fn, from_predict_fn, from_proba_fn, Model, ModelOutput, PredictionConvention};
pub use runner::{Evaluation, EvaluationBuilder};
pub use assayeval_types::{
    DescriptorTransform, DescriptorTransforms, EndpointResult, EvalError, EvalReport, EvalSummary,
    ResultsMap, Sample, ScoreArray, TaskType, TaskTypes, TestSet, MISSING_LABEL,
};
