use crate::cli::WorkspaceArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use mdflow::{engine::progress::ProgressReporter, workflows};

pub async fn run(args: WorkspaceArgs) -> Result<()> {
    let config = PartialAppConfig::load(&args)?;
    let workspace = config.workspace(&args)?;

    let summary = tokio::task::block_in_place(|| {
        workflows::merge::run(&workspace, &ProgressReporter::new())
    })?;

    match &summary.table_path {
        Some(path) => println!(
            "✓ Merged {} partial table(s), {} row(s), into: {}",
            summary.merged_partials.len(),
            summary.rows,
            path.display()
        ),
        None if summary.skipped.is_empty() => println!("No partial tables to merge."),
        None => println!("No readable partial tables to merge."),
    }
    for path in &summary.skipped {
        println!("⚠ Skipped unreadable partial table: {}", path.display());
    }
    Ok(())
}
