use crate::core::io::table::{
    is_partial_table, read_rows_from_path, timestamped_table_path, write_rows_to_path,
};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::workspace::Workspace;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

pub const TABLE_PREFIX: &str = "post_process";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSummary {
    /// `None` when there was nothing to merge.
    pub table_path: Option<PathBuf>,
    pub merged_partials: Vec<PathBuf>,
    /// Partials that could not be read; they stay on disk for inspection.
    pub skipped: Vec<PathBuf>,
    pub rows: usize,
}

/// Unions every worker's partial table into one timestamped table, then removes the
/// partials that went into it.
///
/// A partial that cannot be read (a worker killed mid-write leaves a truncated one)
/// is skipped with a warning and left in place.
///
/// Must only run once all workers have exited; it is not safe against concurrent
/// invocations.
#[instrument(skip_all, name = "merge_workflow")]
pub fn run(workspace: &Workspace, reporter: &ProgressReporter) -> Result<MergeSummary, EngineError> {
    let dir = workspace.post_process_output();
    let entries = std::fs::read_dir(&dir).map_err(|source| EngineError::Io {
        path: dir.clone(),
        source,
    })?;
    let mut partials = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| EngineError::Io {
                path: dir.clone(),
                source,
            })?
            .path();
        if is_partial_table(&path) {
            partials.push(path);
        }
    }
    partials.sort();

    if partials.is_empty() {
        info!(dir = %dir.display(), "No partial tables to merge");
        return Ok(MergeSummary::default());
    }

    reporter.report(Progress::TaskStart {
        total_steps: partials.len() as u64,
    });
    let mut rows = Vec::new();
    let mut merged_partials = Vec::new();
    let mut skipped = Vec::new();
    for path in partials {
        match read_rows_from_path(&path) {
            Ok(partial_rows) => {
                rows.extend(partial_rows);
                merged_partials.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Partial table could not be read; left in place");
                skipped.push(path);
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    if merged_partials.is_empty() {
        warn!(skipped = skipped.len(), "No readable partial tables to merge");
        return Ok(MergeSummary {
            skipped,
            ..MergeSummary::default()
        });
    }

    let table_path = timestamped_table_path(&dir, TABLE_PREFIX);
    write_rows_to_path(&rows, &table_path)?;
    info!(
        path = %table_path.display(),
        partials = merged_partials.len(),
        skipped = skipped.len(),
        rows = rows.len(),
        "Merged partial tables"
    );

    for path in &merged_partials {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Could not remove merged partial table");
        }
    }

    Ok(MergeSummary {
        table_path: Some(table_path),
        rows: rows.len(),
        merged_partials,
        skipped,
    })
}
