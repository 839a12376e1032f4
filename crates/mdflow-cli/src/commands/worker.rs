use crate::cli::WorkerArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdflow::{engine::progress::ProgressReporter, workflows};
use tracing::info;

pub async fn run(args: WorkerArgs) -> Result<()> {
    let config = PartialAppConfig::load(&args.location)?;
    let worker_config = config.worker_config(&args)?;
    let engine = config.engine(&args)?;
    info!(
        program = engine.program(),
        root = %worker_config.workspace.root().display(),
        max_jobs = ?worker_config.max_jobs,
        "Starting worker"
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Draining the queue with '{}'...", engine.program());
    let summary = tokio::task::block_in_place(|| {
        workflows::worker::run(&worker_config, &engine, &reporter)
    })?;

    println!(
        "Worker finished: {} completed, {} failed.",
        summary.completed, summary.failed
    );
    if let Some(path) = &summary.partial_table {
        println!("✓ Results written to: {}", path.display());
    }
    if summary.failed > 0 {
        println!(
            "  Failed jobs remain in {} next to their error files.",
            worker_config.workspace.started().display()
        );
    }
    Ok(())
}
