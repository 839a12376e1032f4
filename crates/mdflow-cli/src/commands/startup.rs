use crate::cli::StartupArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdflow::{engine::progress::ProgressReporter, workflows};
use tracing::info;

pub async fn run(args: StartupArgs) -> Result<()> {
    let config = PartialAppConfig::load(&args.location)?;
    let workspace = config.workspace(&args.location)?;
    let campaign = config.campaign()?;
    info!(
        jobs = campaign.job_count(),
        fields = campaign.fields().len(),
        "Campaign configuration loaded"
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Queueing {} job(s) in {}...",
        campaign.job_count(),
        workspace.root().display()
    );
    let summary = tokio::task::block_in_place(|| {
        workflows::startup::run(&workspace, &campaign, &reporter)
    })?;

    println!("✓ Queued {} new job(s).", summary.written.len());
    if !summary.skipped.is_empty() {
        println!(
            "  {} job(s) already exist in the workspace and were left untouched.",
            summary.skipped.len()
        );
    }
    Ok(())
}
