use super::workspace::Workspace;
use crate::core::models::job::{DESCRIPTOR_EXTENSION, job_name_from_path};
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

pub const ERROR_SIDECAR_SUFFIX: &str = "_error.txt";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Job '{name}' was claimed by another worker first")]
    ClaimRace { name: String },
    #[error("Failed to list '{path}': {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to move '{from}' to '{to}': {source}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write diagnostic '{path}': {source}")]
    Diagnostic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A job this worker owns: its descriptor has been moved into the started store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedJob {
    pub name: String,
    pub descriptor_path: PathBuf,
}

/// Job counts per store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub unbegun: usize,
    /// Claimed and not yet finished; jobs of killed workers also stay here.
    pub started: usize,
    /// Failed jobs parked in the started store next to an error sidecar.
    pub parked: usize,
    pub done: usize,
}

impl QueueStatus {
    pub fn total(&self) -> usize {
        self.unbegun + self.started + self.parked + self.done
    }
}

/// The job state machine: Unbegun → Started → {Done | parked with a diagnostic}.
pub trait WorkQueue: Send + Sync {
    /// Names of every job not yet claimed.
    fn list(&self) -> Result<Vec<String>, QueueError>;

    /// Claims one unbegun job, or returns `None` once none are left.
    fn claim(&self) -> Result<Option<ClaimedJob>, QueueError>;

    fn complete(&self, job: &ClaimedJob) -> Result<PathBuf, QueueError>;

    /// Parks a job in the started store with a diagnostic. Parked jobs are never retried.
    fn fail(&self, job: &ClaimedJob, diagnostic: &str) -> Result<PathBuf, QueueError>;

    fn status(&self) -> Result<QueueStatus, QueueError>;
}

/// A [`WorkQueue`] whose states are directories and whose transitions are renames.
///
/// A rename within one filesystem is atomic, so when several processes race for the
/// same descriptor exactly one of them finds the source still in place.
#[derive(Debug, Clone)]
pub struct DirectoryQueue {
    unbegun: PathBuf,
    started: PathBuf,
    done: PathBuf,
}

fn descriptor_names(dir: &Path) -> Result<Vec<String>, QueueError> {
    let entries = std::fs::read_dir(dir).map_err(|source| QueueError::List {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| QueueError::List {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_descriptor = path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION);
        if is_descriptor && path.is_file() {
            if let Some(name) = job_name_from_path(&path) {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

impl DirectoryQueue {
    pub fn new(workspace: &Workspace) -> Self {
        Self {
            unbegun: workspace.unbegun(),
            started: workspace.started(),
            done: workspace.done(),
        }
    }

    fn descriptor_file(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.{DESCRIPTOR_EXTENSION}"))
    }

    pub fn error_sidecar(&self, name: &str) -> PathBuf {
        self.started.join(format!("{name}{ERROR_SIDECAR_SUFFIX}"))
    }

    /// Attempts to claim one specific job.
    ///
    /// Fails with [`QueueError::ClaimRace`] when another worker moved it first.
    pub fn try_claim(&self, name: &str) -> Result<ClaimedJob, QueueError> {
        let from = Self::descriptor_file(&self.unbegun, name);
        let to = Self::descriptor_file(&self.started, name);
        match std::fs::rename(&from, &to) {
            Ok(()) => Ok(ClaimedJob {
                name: name.to_string(),
                descriptor_path: to,
            }),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::AlreadyExists) => {
                Err(QueueError::ClaimRace {
                    name: name.to_string(),
                })
            }
            Err(source) => Err(QueueError::Relocate { from, to, source }),
        }
    }
}

impl WorkQueue for DirectoryQueue {
    fn list(&self) -> Result<Vec<String>, QueueError> {
        descriptor_names(&self.unbegun)
    }

    fn claim(&self) -> Result<Option<ClaimedJob>, QueueError> {
        let mut rng = rand::thread_rng();
        loop {
            let mut candidates = self.list()?;
            if candidates.is_empty() {
                return Ok(None);
            }
            while !candidates.is_empty() {
                let name = candidates.swap_remove(rng.gen_range(0..candidates.len()));
                match self.try_claim(&name) {
                    Ok(job) => {
                        debug!(job = %job.name, "Claimed job");
                        return Ok(Some(job));
                    }
                    Err(QueueError::ClaimRace { name }) => {
                        trace!(job = %name, "Lost claim race, trying another candidate");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    fn complete(&self, job: &ClaimedJob) -> Result<PathBuf, QueueError> {
        let to = Self::descriptor_file(&self.done, &job.name);
        std::fs::rename(&job.descriptor_path, &to).map_err(|source| QueueError::Relocate {
            from: job.descriptor_path.clone(),
            to: to.clone(),
            source,
        })?;
        Ok(to)
    }

    fn fail(&self, job: &ClaimedJob, diagnostic: &str) -> Result<PathBuf, QueueError> {
        let path = self.error_sidecar(&job.name);
        std::fs::write(&path, diagnostic).map_err(|source| QueueError::Diagnostic {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn status(&self) -> Result<QueueStatus, QueueError> {
        let mut status = QueueStatus {
            unbegun: descriptor_names(&self.unbegun)?.len(),
            done: descriptor_names(&self.done)?.len(),
            ..Default::default()
        };
        for name in descriptor_names(&self.started)? {
            if self.error_sidecar(&name).is_file() {
                status.parked += 1;
            } else {
                status.started += 1;
            }
        }
        Ok(status)
    }
}
