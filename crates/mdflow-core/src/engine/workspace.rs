use super::error::EngineError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const UNBEGUN_DIR: &str = "unbegun_simulations";
pub const STARTED_DIR: &str = "started_simulations";
pub const DONE_DIR: &str = "done_simulations";
pub const POST_PROCESS_DIR: &str = "post_process_output";
pub const OUTPUT_DIR: &str = "output";
pub const TRAJECTORY_DIR: &str = "traj";
pub const SERIES_DIR: &str = "csv";
pub const MATERIALS_DIR: &str = "materials";

/// The directory tree shared by every process of one campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn unbegun(&self) -> PathBuf {
        self.root.join(UNBEGUN_DIR)
    }

    pub fn started(&self) -> PathBuf {
        self.root.join(STARTED_DIR)
    }

    pub fn done(&self) -> PathBuf {
        self.root.join(DONE_DIR)
    }

    pub fn post_process_output(&self) -> PathBuf {
        self.root.join(POST_PROCESS_DIR)
    }

    pub fn trajectory_output(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR).join(TRAJECTORY_DIR)
    }

    pub fn series_output(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR).join(SERIES_DIR)
    }

    pub fn materials(&self) -> PathBuf {
        self.root.join(MATERIALS_DIR)
    }

    pub fn directories(&self) -> [PathBuf; 7] {
        [
            self.unbegun(),
            self.started(),
            self.done(),
            self.post_process_output(),
            self.trajectory_output(),
            self.series_output(),
            self.materials(),
        ]
    }

    /// Creates every directory of the layout. Existing directories are left untouched.
    pub fn prepare(&self) -> Result<(), EngineError> {
        for dir in self.directories() {
            std::fs::create_dir_all(&dir).map_err(|source| EngineError::Io {
                path: dir.clone(),
                source,
            })?;
            debug!(dir = %dir.display(), "Workspace directory ready");
        }
        Ok(())
    }

    /// Fails if any directory of the layout is missing.
    pub fn validate(&self) -> Result<(), EngineError> {
        let missing: Vec<PathBuf> = self
            .directories()
            .into_iter()
            .filter(|dir| !dir.is_dir())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::WorkspaceLayout { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prepare_creates_the_full_layout_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        assert!(matches!(
            workspace.validate(),
            Err(EngineError::WorkspaceLayout { ref missing }) if missing.len() == 7
        ));

        workspace.prepare().unwrap();
        workspace.prepare().unwrap();
        workspace.validate().unwrap();
        assert!(dir.path().join("output/traj").is_dir());
        assert!(dir.path().join("post_process_output").is_dir());
    }

    #[test]
    fn validate_names_the_missing_directory() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.prepare().unwrap();
        std::fs::remove_dir(workspace.done()).unwrap();
        match workspace.validate() {
            Err(EngineError::WorkspaceLayout { missing }) => {
                assert_eq!(missing, vec![workspace.done()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
