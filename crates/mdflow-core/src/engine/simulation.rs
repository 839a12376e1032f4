use crate::core::models::frame::Frame;
use crate::core::models::job::JobDescriptor;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Failed to launch integrator '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Integrator exited with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },
    #[error("Integrator finished without writing its {kind} to '{path}'")]
    MissingOutput { kind: &'static str, path: PathBuf },
    #[error("{0}")]
    Other(String),
}

/// Everything handed to the integrator for one job.
#[derive(Debug, Clone, Copy)]
pub struct SimulationRequest<'a> {
    pub job_name: &'a str,
    /// The descriptor as it sits in the started store.
    pub descriptor_path: &'a Path,
    pub descriptor: &'a JobDescriptor,
    /// The first frame of the referenced material file.
    pub material: &'a Frame,
}

/// The external particle-dynamics integrator.
///
/// Implementations must write the trajectory and the scalar series to the output
/// paths named in the descriptor before returning `Ok`.
pub trait SimulationEngine: Send + Sync {
    fn run(&self, request: &SimulationRequest<'_>) -> Result<(), SimulationError>;
}

/// Runs an external program once per job, passing the descriptor path as its last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SimulationEngine for CommandEngine {
    fn run(&self, request: &SimulationRequest<'_>) -> Result<(), SimulationError> {
        debug!(job = request.job_name, program = %self.program, "Launching integrator");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(request.descriptor_path)
            .env("MDFLOW_JOB_NAME", request.job_name)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SimulationError::Launch {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SimulationError::ExitStatus {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Checks that both outputs a descriptor names exist.
pub fn verify_outputs(descriptor: &JobDescriptor) -> Result<(), SimulationError> {
    for (kind, path) in [
        ("trajectory", &descriptor.traj_output_path),
        ("scalar series", &descriptor.csv_output_path),
    ] {
        if !path.is_file() {
            return Err(SimulationError::MissingOutput {
                kind,
                path: path.clone(),
            });
        }
    }
    Ok(())
}
