use super::config::WorkerConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::queue::{ClaimedJob, WorkQueue};
use super::simulation::{SimulationEngine, SimulationError, SimulationRequest, verify_outputs};
use crate::core::analysis::pipeline::PhysicalQuantityPipeline;
use crate::core::io::traits::TrajectoryFile;
use crate::core::io::xyz::{XyzError, XyzFile};
use crate::core::models::job::{DescriptorError, JobDescriptor};
use crate::core::models::results::ResultRow;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// Why one job could not be simulated. Always confined to that job.
#[derive(Debug, Error)]
pub enum SimulationFailure {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("Failed to load material '{path}': {source}")]
    Material {
        path: PathBuf,
        #[source]
        source: XyzError,
    },
    #[error("Material file '{0}' contains no frames")]
    EmptyMaterial(PathBuf),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug)]
pub enum JobOutcome {
    Completed { descriptor_path: PathBuf },
    Failed { reason: String },
}

/// Rows and counters gathered by one drain, moved through the loop by value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultAccumulator {
    rows: Vec<ResultRow>,
    completed: usize,
    failed: usize,
}

impl ResultAccumulator {
    pub fn with_row(mut self, row: ResultRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_completed(mut self) -> Self {
        self.completed += 1;
        self
    }

    pub fn with_failed(mut self) -> Self {
        self.failed += 1;
        self
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }
}

/// What one drain produced, and the queue error that cut it short, if any.
#[derive(Debug)]
pub struct DrainOutcome {
    pub results: ResultAccumulator,
    pub interrupted: Option<EngineError>,
}

/// Claims and executes jobs until the queue is empty.
pub struct Worker<'a> {
    queue: &'a dyn WorkQueue,
    engine: &'a dyn SimulationEngine,
    config: &'a WorkerConfig,
    pipeline: PhysicalQuantityPipeline,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a> Worker<'a> {
    pub fn new(
        queue: &'a dyn WorkQueue,
        engine: &'a dyn SimulationEngine,
        config: &'a WorkerConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            queue,
            engine,
            config,
            pipeline: PhysicalQuantityPipeline::new(),
            reporter,
        }
    }

    fn simulate(&self, job: &ClaimedJob) -> Result<(), SimulationFailure> {
        let descriptor = JobDescriptor::load(&job.descriptor_path)?;
        let material = XyzFile::read_from_path(&descriptor.material).map_err(|source| {
            SimulationFailure::Material {
                path: descriptor.material.clone(),
                source,
            }
        })?;
        let frame = material
            .first()
            .ok_or_else(|| SimulationFailure::EmptyMaterial(descriptor.material.clone()))?;

        let request = SimulationRequest {
            job_name: &job.name,
            descriptor_path: &job.descriptor_path,
            descriptor: &descriptor,
            material: frame,
        };
        self.engine.run(&request)?;
        verify_outputs(&descriptor)?;
        Ok(())
    }

    /// Parks a job, logging instead of failing when the diagnostic cannot be written.
    fn park(&self, job: &ClaimedJob, reason: String) -> JobOutcome {
        if let Err(e) = self.queue.fail(job, &reason) {
            warn!(job = %job.name, error = %e, "Could not write the error diagnostic");
        }
        self.reporter.report(Progress::JobFailed {
            name: job.name.clone(),
            reason: reason.clone(),
        });
        JobOutcome::Failed { reason }
    }

    /// Runs one claimed job and moves it to its terminal store.
    ///
    /// Every failure, including a queue error while moving the job, stays confined to
    /// this job.
    pub fn execute(&self, job: &ClaimedJob) -> JobOutcome {
        match self.simulate(job) {
            Ok(()) => match self.queue.complete(job) {
                Ok(descriptor_path) => {
                    info!(job = %job.name, "Job completed");
                    self.reporter.report(Progress::JobCompleted {
                        name: job.name.clone(),
                    });
                    JobOutcome::Completed { descriptor_path }
                }
                Err(e) => {
                    warn!(job = %job.name, error = %e, "Simulated job could not be moved to done");
                    let reason =
                        format!("Simulation finished but the job could not be completed: {e}");
                    self.park(job, reason)
                }
            },
            Err(failure) => {
                let reason = failure.to_string();
                error!(job = %job.name, %reason, "Job failed");
                self.park(job, reason)
            }
        }
    }

    fn step(&self, acc: ResultAccumulator, job: &ClaimedJob) -> ResultAccumulator {
        self.reporter.report(Progress::JobClaimed {
            name: job.name.clone(),
        });
        match self.execute(job) {
            JobOutcome::Failed { .. } => acc.with_failed(),
            JobOutcome::Completed { descriptor_path } => {
                let acc = acc.with_completed();
                if !self.config.analyze_completed {
                    return acc;
                }
                let row = match self.pipeline.evaluate_descriptor(&job.name, &descriptor_path) {
                    Ok(result) => ResultRow::from(&result),
                    Err(e) => {
                        warn!(job = %job.name, error = %e, "Post-processing failed for completed job");
                        ResultRow::failed(job.name.clone(), e.to_string())
                    }
                };
                acc.with_row(row)
            }
        }
    }

    /// Claims and executes jobs until none are left or the job limit is reached.
    ///
    /// A claim that fails with an I/O error stops the loop, but the results gathered
    /// so far are still returned alongside it.
    pub fn drain(&self) -> DrainOutcome {
        let mut acc = ResultAccumulator::default();
        while self.config.max_jobs.is_none_or(|max| acc.processed() < max) {
            let job = match self.queue.claim() {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Claiming stopped the drain");
                    return DrainOutcome {
                        results: acc,
                        interrupted: Some(e.into()),
                    };
                }
            };
            acc = self.step(acc, &job);
        }
        DrainOutcome {
            results: acc,
            interrupted: None,
        }
    }
}
