use crate::cli::VolumeArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdflow::core::models::results::{AggregateResult, LatticeParameter};
use mdflow::{engine::progress::ProgressReporter, workflows};

fn describe(result: &AggregateResult) -> String {
    let lattice = match &result.lattice {
        LatticeParameter::Constant(a) => format!("a = {:.4} Å", a),
        LatticeParameter::RawCell(cell) => format!("cell = {}", cell),
        LatticeParameter::Undefined => "lattice undefined".to_string(),
    };
    format!(
        "{} ({} members): V0 = {:.4} Å³, {}, B = {:.2} GPa",
        result.group_label, result.members, result.equilibrium_volume, lattice, result.bulk_modulus
    )
}

pub async fn run(args: VolumeArgs) -> Result<()> {
    let config = PartialAppConfig::load(&args.location)?;
    let volume_config = config.volume_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Fitting volume series...");
    let summary =
        tokio::task::block_in_place(|| workflows::volume::run(&volume_config, &reporter))?;

    for result in &summary.results {
        println!("  {}", describe(result));
        for diagnostic in &result.diagnostics {
            println!("    ! {}", diagnostic);
        }
        if let Some(message) = &result.lindemann_message {
            println!("    {}", message);
        }
    }
    if !summary.single_points.is_empty() {
        println!(
            "  {} job(s) without a volume scale were left to `post-process`.",
            summary.single_points.len()
        );
    }
    if !summary.pruned.is_empty() {
        println!("  Removed {} file(s) of non-optimal members.", summary.pruned.len());
    }
    println!("✓ Volume table written to: {}", summary.table_path.display());
    Ok(())
}
