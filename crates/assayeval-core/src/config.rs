use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assayeval_types::{DescriptorTransforms, TaskTypes};
use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointList;
use crate::model::PredictionConvention;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    pub task_types: TaskTypes,
    #[serde(default)]
    pub desc_transforms: DescriptorTransforms,
    #[serde(default)]
    pub convention: PredictionConvention,
    #[serde(default)]
    pub add_descriptors: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
}

impl EvalConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s).context("Invalid YAML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s).context("Invalid JSON config")?;
        config.validate()?;
        Ok(config)
    }

    /// `.json` files are read as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
        .with_context(|| format!("Failed to load config {:?}", path))
    }

    /// Checks the endpoint list can be built from this config.
    pub fn validate(&self) -> Result<()> {
        EndpointList::new(&self.task_types, &self.desc_transforms, self.add_descriptors)?;
        Ok(())
    }
}
