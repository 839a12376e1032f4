use crate::cli::WorkspaceArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use mdflow::engine::error::EngineError;
use mdflow::engine::queue::{DirectoryQueue, WorkQueue};

pub async fn run(args: WorkspaceArgs) -> Result<()> {
    let config = PartialAppConfig::load(&args)?;
    let workspace = config.workspace(&args)?;
    workspace.validate()?;

    let status = DirectoryQueue::new(&workspace)
        .status()
        .map_err(EngineError::from)?;

    println!("Workspace: {}", workspace.root().display());
    println!("  unbegun : {:>6}", status.unbegun);
    println!("  started : {:>6}", status.started);
    println!("  failed  : {:>6}", status.parked);
    println!("  done    : {:>6}", status.done);
    println!("  total   : {:>6}", status.total());
    Ok(())
}
