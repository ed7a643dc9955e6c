use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use assayeval_types::{Sample, TestSet};
use serde::Deserialize;
use tracing::debug;

pub trait DataSource: Send + Sync {
    fn load(&self) -> Result<TestSet>;
}

pub struct InMemoryDataSource {
    test_set: TestSet,
}

impl InMemoryDataSource {
    pub fn new(test_set: TestSet) -> Self {
        Self { test_set }
    }
}

impl DataSource for InMemoryDataSource {
    fn load(&self) -> Result<TestSet> {
        Ok(self.test_set.clone())
    }
}

#[derive(Debug, Deserialize)]
struct JsonlRecord {
    id: String,
    #[serde(flatten)]
    sample: Sample,
}

/// Read JSONL where each line is one sample:
/// - {"id": "...", "labels": {"task": 0|1|-1|<real>}, "descriptors"?: [...], "features"?: [...]}
pub struct JsonlDataSource {
    path: PathBuf,
}

impl JsonlDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for JsonlDataSource {
    fn load(&self) -> Result<TestSet> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        parse_jsonl(&content)
    }
}

pub fn parse_jsonl(content: &str) -> Result<TestSet> {
    let mut test_set = TestSet::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: JsonlRecord = serde_json::from_str(line)
            .with_context(|| format!("Invalid sample on line {}", idx + 1))?;
        if test_set.contains(&record.id) {
            bail!("Line {}: duplicate sample id '{}'", idx + 1, record.id);
        }
        test_set.insert(record.id, record.sample);
    }
    if test_set.is_empty() {
        return Err(anyhow!("No samples found"));
    }
    debug!(samples = test_set.len(), "loaded test set");
    Ok(test_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_jsonl_samples() {
        let content = r#"
{"id": "CCO", "labels": {"tox": 1, "logp": -0.3}, "descriptors": [46.07], "features": [1, 0]}

{"id": "c1ccccc1", "labels": {"tox": -1, "logp": 2.1}, "features": [0, 1]}
"#;
        let set = parse_jsonl(content).unwrap();
        assert_eq!(set.sorted_ids(), vec!["CCO", "c1ccccc1"]);
        let ethanol = set.get("CCO").unwrap();
        assert_eq!(ethanol.labels["tox"], 1.0);
        assert_eq!(ethanol.descriptors, vec![46.07]);
        assert!(set.get("c1ccccc1").unwrap().descriptors.is_empty());
    }

    #[test]
    fn test_parse_jsonl_reports_line() {
        let content = "{\"id\": \"a\", \"labels\": {}}\n{\"labels\": {}}\n";
        let err = parse_jsonl(content).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_jsonl_rejects_duplicates() {
        let content = "{\"id\": \"a\", \"labels\": {}}\n{\"id\": \"a\", \"labels\": {}}\n";
        let err = parse_jsonl(content).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_jsonl_data_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "a", "labels": {{"t1": 0}}}}"#).unwrap();
        writeln!(file, r#"{{"id": "b", "labels": {{"t1": 1}}}}"#).unwrap();

        let set = JsonlDataSource::new(file.path()).load().unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = JsonlDataSource::new("/nonexistent/test_set.jsonl").load().unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
