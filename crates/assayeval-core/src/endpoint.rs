use std::collections::BTreeMap;

use assayeval_types::{DescriptorTransforms, EvalError, Result, TaskType, TaskTypes};

/// A named evaluation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Primary task, labelled through `Sample::labels`.
    Task(String),
    /// Auxiliary regression target read from `Sample::descriptors[index]`.
    Descriptor { name: String, index: usize },
}

impl Endpoint {
    /// Descriptor endpoint names are the decimal encoding of their position.
    pub fn descriptor(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let index = name.trim().parse::<usize>().map_err(|_| {
            EvalError::InvalidConfiguration(format!(
                "descriptor key '{name}' is not a descriptor index"
            ))
        })?;
        Ok(Endpoint::Descriptor { name, index })
    }

    pub fn name(&self) -> &str {
        match self {
            Endpoint::Task(name) => name,
            Endpoint::Descriptor { name, .. } => name,
        }
    }

    pub fn is_descriptor(&self) -> bool {
        matches!(self, Endpoint::Descriptor { .. })
    }
}

/// The fixed column order predictions follow: sorted task names, then sorted
/// descriptor names when descriptors are evaluated.
#[derive(Debug, Clone)]
pub struct EndpointList {
    endpoints: Vec<Endpoint>,
    task_types: BTreeMap<String, TaskType>,
    n_targets: usize,
}

impl EndpointList {
    pub fn new(
        task_types: &TaskTypes,
        desc_transforms: &DescriptorTransforms,
        add_descriptors: bool,
    ) -> Result<Self> {
        let mut targets: Vec<&String> = task_types.keys().collect();
        targets.sort_unstable();

        let mut endpoints: Vec<Endpoint> =
            targets.iter().map(|t| Endpoint::Task((*t).clone())).collect();
        let mut local_types: BTreeMap<String, TaskType> = task_types
            .iter()
            .map(|(name, t)| (name.clone(), *t))
            .collect();

        if add_descriptors {
            let mut descriptors: Vec<&String> = desc_transforms.keys().collect();
            descriptors.sort_unstable();
            for desc in descriptors {
                if task_types.contains_key(desc) {
                    return Err(EvalError::InvalidConfiguration(format!(
                        "descriptor '{desc}' has the same name as a task"
                    )));
                }
                endpoints.push(Endpoint::descriptor(desc.clone())?);
                local_types.insert(desc.clone(), TaskType::Regression);
            }
        }

        Ok(Self {
            endpoints,
            task_types: local_types,
            n_targets: targets.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Number of primary tasks.
    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    pub fn names(&self) -> Vec<&str> {
        self.endpoints.iter().map(Endpoint::name).collect()
    }

    /// Task types extended with `regression` for every descriptor endpoint.
    pub fn task_types(&self) -> &BTreeMap<String, TaskType> {
        &self.task_types
    }

    pub fn task_type(&self, endpoint: &Endpoint) -> TaskType {
        if endpoint.is_descriptor() {
            return TaskType::Regression;
        }
        self.task_types
            .get(endpoint.name())
            .copied()
            .unwrap_or(TaskType::Regression)
    }
}

/// Task types with descriptor endpoints added as regression, the map the
/// aggregators expect when descriptors were evaluated.
pub fn endpoint_task_types(
    task_types: &TaskTypes,
    desc_transforms: &DescriptorTransforms,
    add_descriptors: bool,
) -> Result<BTreeMap<String, TaskType>> {
    Ok(EndpointList::new(task_types, desc_transforms, add_descriptors)?
        .task_types
        .clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assayeval_types::DescriptorTransform;

    fn types(pairs: &[(&str, TaskType)]) -> TaskTypes {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn transforms(keys: &[&str]) -> DescriptorTransforms {
        keys.iter()
            .map(|k| (k.to_string(), DescriptorTransform::None))
            .collect()
    }

    #[test]
    fn test_tasks_sorted_then_descriptors_sorted() {
        let list = EndpointList::new(
            &types(&[("zeta", TaskType::Regression), ("alpha", TaskType::Classification)]),
            &transforms(&["2", "10", "0"]),
            true,
        )
        .unwrap();

        // string order: "10" precedes "2"
        assert_eq!(list.names(), vec!["alpha", "zeta", "0", "10", "2"]);
        assert_eq!(list.n_targets(), 2);
        assert_eq!(list.task_types()["10"], TaskType::Regression);

        let endpoints: Vec<&Endpoint> = list.iter().collect();
        assert!(!endpoints[0].is_descriptor());
        assert_eq!(list.task_type(endpoints[0]), TaskType::Classification);
        assert!(endpoints[2].is_descriptor());
        assert_eq!(list.task_type(endpoints[2]), TaskType::Regression);
    }

    #[test]
    fn test_descriptors_ignored_when_disabled() {
        let list = EndpointList::new(
            &types(&[("t1", TaskType::Classification)]),
            &transforms(&["0", "1"]),
            false,
        )
        .unwrap();
        assert_eq!(list.names(), vec!["t1"]);
        assert!(!list.task_types().contains_key("0"));
    }

    #[test]
    fn test_non_numeric_descriptor_is_invalid() {
        let err = EndpointList::new(&TaskTypes::new(), &transforms(&["logp"]), true).unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_descriptor_colliding_with_task_is_invalid() {
        let err = EndpointList::new(
            &types(&[("3", TaskType::Regression)]),
            &transforms(&["3"]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfiguration(_)));
    }
}
