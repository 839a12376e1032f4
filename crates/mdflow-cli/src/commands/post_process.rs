use crate::cli::WorkspaceArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdflow::core::models::results::RowKind;
use mdflow::{engine::progress::ProgressReporter, workflows};

pub async fn run(args: WorkspaceArgs) -> Result<()> {
    let config = PartialAppConfig::load(&args)?;
    let workspace = config.workspace(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Post-processing completed jobs...");
    let summary =
        tokio::task::block_in_place(|| workflows::post_process::run(&workspace, &reporter))?;

    let failed = summary
        .rows
        .iter()
        .filter(|row| row.kind == RowKind::Failed)
        .count();
    println!(
        "✓ {} row(s) written to: {}",
        summary.rows.len(),
        summary.table_path.display()
    );
    if failed > 0 {
        println!("  {} job(s) could not be evaluated; see `error_message`.", failed);
    }
    Ok(())
}
