use crate::core::io::table::write_partial;
use crate::engine::config::WorkerConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::queue::DirectoryQueue;
use crate::engine::simulation::SimulationEngine;
use crate::engine::worker::Worker;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSummary {
    pub completed: usize,
    pub failed: usize,
    /// The partial table holding this worker's rows, if it analyzed any job.
    pub partial_table: Option<PathBuf>,
}

/// Drains the workspace queue in this process and flushes the results once.
#[instrument(skip_all, name = "worker_workflow")]
pub fn run(
    config: &WorkerConfig,
    engine: &dyn SimulationEngine,
    reporter: &ProgressReporter,
) -> Result<WorkerSummary, EngineError> {
    config.workspace.validate()?;
    let queue = DirectoryQueue::new(&config.workspace);

    reporter.report(Progress::PhaseStart {
        name: "Draining queue",
    });
    let outcome = Worker::new(&queue, engine, config, reporter).drain();
    reporter.report(Progress::PhaseFinish);

    let acc = outcome.results;
    let (completed, failed) = (acc.completed(), acc.failed());
    let rows = acc.into_rows();
    let partial_table = if rows.is_empty() {
        None
    } else {
        let path = write_partial(&config.workspace.post_process_output(), &rows)?;
        info!(path = %path.display(), rows = rows.len(), "Partial results written");
        Some(path)
    };

    if let Some(e) = outcome.interrupted {
        warn!(completed, failed, "Worker stopped early; gathered results were kept");
        return Err(e);
    }

    info!(completed, failed, "Worker finished");
    Ok(WorkerSummary {
        completed,
        failed,
        partial_table,
    })
}
