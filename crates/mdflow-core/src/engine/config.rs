use super::workspace::Workspace;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub workspace: Workspace,
    /// Stop after this many jobs even if the queue is not empty.
    pub max_jobs: Option<usize>,
    /// Feed every completed job through the post-processing pipeline.
    pub analyze_completed: bool,
}

#[derive(Default)]
pub struct WorkerConfigBuilder {
    workspace_root: Option<PathBuf>,
    max_jobs: Option<usize>,
    analyze_completed: Option<bool>,
}

impl WorkerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace_root(mut self, path: PathBuf) -> Self {
        self.workspace_root = Some(path);
        self
    }
    pub fn max_jobs(mut self, n: usize) -> Self {
        self.max_jobs = Some(n);
        self
    }
    pub fn analyze_completed(mut self, enabled: bool) -> Self {
        self.analyze_completed = Some(enabled);
        self
    }

    pub fn build(self) -> Result<WorkerConfig, ConfigError> {
        if self.max_jobs == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_jobs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(WorkerConfig {
            workspace: Workspace::new(
                self.workspace_root
                    .ok_or(ConfigError::MissingParameter("workspace_root"))?,
            ),
            max_jobs: self.max_jobs,
            analyze_completed: self.analyze_completed.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeConfig {
    pub workspace: Workspace,
    /// Delete outputs and descriptors of every non-optimal volume-series member.
    pub prune_non_optimal: bool,
}

#[derive(Default)]
pub struct VolumeConfigBuilder {
    workspace_root: Option<PathBuf>,
    prune_non_optimal: Option<bool>,
}

impl VolumeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace_root(mut self, path: PathBuf) -> Self {
        self.workspace_root = Some(path);
        self
    }
    pub fn prune_non_optimal(mut self, enabled: bool) -> Self {
        self.prune_non_optimal = Some(enabled);
        self
    }

    pub fn build(self) -> Result<VolumeConfig, ConfigError> {
        Ok(VolumeConfig {
            workspace: Workspace::new(
                self.workspace_root
                    .ok_or(ConfigError::MissingParameter("workspace_root"))?,
            ),
            prune_non_optimal: self.prune_non_optimal.unwrap_or(false),
        })
    }
}
