//! # Workflows Module
//!
//! End-to-end procedures over a campaign workspace. Each is one entry point that the
//! command-line front end maps to a subcommand.
//!
//! - **Startup** ([`startup`]) - Lays out the workspace and expands a campaign into
//!   one job descriptor per parameter combination.
//! - **Worker** ([`worker`]) - Drains the queue and writes this process's partial
//!   result table. Any number of workers may run at once.
//! - **Post-processing** ([`post_process`]) - Re-evaluates every completed job into one
//!   timestamped table.
//! - **Volume series** ([`volume`]) - Groups completed jobs by configuration, fits the
//!   equation of state per group and checks the Lindemann criterion.
//! - **Merge** ([`merge`]) - Unions the workers' partial tables once all have exited.

pub mod merge;
pub mod post_process;
pub mod startup;
pub mod volume;
pub mod worker;

use crate::core::models::job::{DESCRIPTOR_EXTENSION, JobDescriptor, job_name_from_path};
use crate::engine::error::EngineError;
use std::path::{Path, PathBuf};

/// A descriptor found in the done store.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedJob {
    pub name: String,
    pub descriptor_path: PathBuf,
    pub descriptor: JobDescriptor,
}

/// Loads every descriptor in `dir`, sorted by job name.
pub(crate) fn load_completed_jobs(dir: &Path) -> Result<Vec<CompletedJob>, EngineError> {
    let entries = std::fs::read_dir(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut jobs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| EngineError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXTENSION) {
            continue;
        }
        let Some(name) = job_name_from_path(&path) else {
            continue;
        };
        let descriptor = JobDescriptor::load(&path)?;
        jobs.push(CompletedJob {
            name,
            descriptor_path: path,
            descriptor,
        });
    }
    jobs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(jobs)
}
