use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::error::{PipelineError, PipelineResult};
use crate::step::StepDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Step '{0}' is registered twice")]
    DuplicateStep(String),

    #[error("Step '{step}' requires unknown step '{prerequisite}'")]
    MissingPrerequisite { step: String, prerequisite: String },

    #[error("Circular dependency detected between: {}", .0.join(", "))]
    CircularDependency(Vec<String>),
}

#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, step: StepDescriptor) -> Result<(), GraphError> {
        if self.index.contains_key(step.name()) {
            return Err(GraphError::DuplicateStep(step.name().to_string()));
        }
        self.index.insert(step.name(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StepDescriptor> {
        self.index.get(name).map(|&i| &self.steps[i])
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn check_requested<S: AsRef<str>>(&self, requested: &[S]) -> PipelineResult<()> {
        match requested.iter().find(|name| self.get(name.as_ref()).is_none()) {
            Some(unknown) => Err(PipelineError::UnknownStep(unknown.as_ref().to_string())),
            None => Ok(()),
        }
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        for step in &self.steps {
            for prerequisite in step.prerequisites() {
                if self.get(prerequisite).is_none() {
                    return Err(GraphError::MissingPrerequisite {
                        step: step.name().to_string(),
                        prerequisite: prerequisite.to_string(),
                    });
                }
            }
        }

        self.topological_order().map(|_| ())
    }

    /// Step names ordered so that each comes after all of its prerequisites.
    /// Ties keep registration order.
    pub fn topological_order(&self) -> Result<Vec<&'static str>, GraphError> {
        let mut in_degree: Vec<usize> = vec![0; self.steps.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.steps.len()];

        for (i, step) in self.steps.iter().enumerate() {
            for prerequisite in step.prerequisites() {
                if let Some(&p) = self.index.get(prerequisite) {
                    dependents[p].push(i);
                    in_degree[i] += 1;
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..self.steps.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.steps.len());

        while let Some(i) = queue.pop_front() {
            order.push(self.steps[i].name());
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != self.steps.len() {
            let remaining = self
                .steps
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, s)| s.name().to_string())
                .collect();
            return Err(GraphError::CircularDependency(remaining));
        }

        Ok(order)
    }
}
