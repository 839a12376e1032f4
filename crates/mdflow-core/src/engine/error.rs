use super::config::ConfigError;
use super::queue::QueueError;
use crate::core::analysis::pipeline::PipelineError;
use crate::core::io::table::TableError;
use crate::core::models::job::DescriptorError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Workspace layout is incomplete; missing directories: {missing:?}")]
    WorkspaceLayout { missing: Vec<PathBuf> },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Job queue error: {source}")]
    Queue {
        #[from]
        source: QueueError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Job descriptor error: {source}")]
    Descriptor {
        #[from]
        source: DescriptorError,
    },

    #[error("Result table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Post-processing failed: {source}")]
    Pipeline {
        #[from]
        source: PipelineError,
    },
}
