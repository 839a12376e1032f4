use super::{CompletedJob, load_completed_jobs};
use crate::core::analysis::pipeline::PhysicalQuantityPipeline;
use crate::core::io::table::{timestamped_table_path, write_rows_to_path};
use crate::core::models::results::ResultRow;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::workspace::Workspace;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const TABLE_PREFIX: &str = "post_process";

#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessSummary {
    pub table_path: PathBuf,
    pub rows: Vec<ResultRow>,
}

fn evaluate(
    pipeline: &PhysicalQuantityPipeline,
    job: &CompletedJob,
    reporter: &ProgressReporter,
) -> ResultRow {
    let row = pipeline
        .evaluate_descriptor(&job.name, &job.descriptor_path)
        .map(|result| ResultRow::from(&result))
        .unwrap_or_else(|e| {
            warn!(job = %job.name, error = %e, "Post-processing failed");
            ResultRow::failed(job.name.clone(), e.to_string())
        });
    reporter.report(Progress::TaskIncrement);
    row
}

/// Evaluates every job in the done store and writes one timestamped table.
#[instrument(skip_all, name = "post_process_workflow")]
pub fn run(
    workspace: &Workspace,
    reporter: &ProgressReporter,
) -> Result<PostProcessSummary, EngineError> {
    workspace.validate()?;
    let jobs = load_completed_jobs(&workspace.done())?;
    info!(jobs = jobs.len(), "Post-processing completed jobs");

    let pipeline = PhysicalQuantityPipeline::new();
    reporter.report(Progress::TaskStart {
        total_steps: jobs.len() as u64,
    });

    #[cfg(feature = "parallel")]
    let rows: Vec<ResultRow> = jobs
        .par_iter()
        .map(|job| evaluate(&pipeline, job, reporter))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<ResultRow> = jobs
        .iter()
        .map(|job| evaluate(&pipeline, job, reporter))
        .collect();

    reporter.report(Progress::TaskFinish);

    let table_path = timestamped_table_path(&workspace.post_process_output(), TABLE_PREFIX);
    write_rows_to_path(&rows, &table_path)?;
    info!(path = %table_path.display(), rows = rows.len(), "Post-process table written");

    Ok(PostProcessSummary { table_path, rows })
}
