use crate::cli::{VolumeArgs, WorkerArgs, WorkspaceArgs};
use crate::error::{CliError, Result};
use mdflow::engine::config::{VolumeConfig, VolumeConfigBuilder, WorkerConfig, WorkerConfigBuilder};
use mdflow::engine::simulation::CommandEngine;
use mdflow::engine::workspace::Workspace;
use mdflow::workflows::startup::Campaign;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toml::Value;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialEngineConfig {
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialWorkerConfig {
    max_jobs: Option<usize>,
    analyze_completed: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialVolumeConfig {
    prune_non_optimal: Option<bool>,
}

/// The campaign file as written by the user; every section is optional until a
/// subcommand needs it.
///
/// ```toml
/// workspace = "runs/argon"
///
/// [engine]
/// program = "lmp-driver"
/// args = ["--gpu"]
///
/// [campaign]
/// material = "Ar"
/// ensemble = "nvt"
/// steps = 20000
/// temperature = [50, 100]
/// volume_scale = [0.94, 0.97, 1.0, 1.03, 1.06]
/// ```
///
/// Campaign fields keep their declaration order, which fixes both the job names and
/// the expansion order.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    workspace: Option<PathBuf>,
    engine: Option<PartialEngineConfig>,
    worker: Option<PartialWorkerConfig>,
    volume: Option<PartialVolumeConfig>,
    campaign: Option<toml::Table>,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads the config file named on the command line, or starts empty without one.
    pub fn load(location: &WorkspaceArgs) -> Result<Self> {
        match &location.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn workspace(&self, location: &WorkspaceArgs) -> Result<Workspace> {
        location
            .workspace
            .as_ref()
            .or(self.workspace.as_ref())
            .map(Workspace::new)
            .ok_or_else(|| {
                CliError::Config(
                    "A workspace is required either in the config file (`workspace`) or via --workspace."
                        .to_string(),
                )
            })
    }

    pub fn campaign(&self) -> Result<Campaign> {
        let table = self.campaign.as_ref().ok_or_else(|| {
            CliError::Config("A `[campaign]` section is required to queue jobs.".to_string())
        })?;
        if table.is_empty() {
            return Err(CliError::Config(
                "The `[campaign]` section must define at least one field.".to_string(),
            ));
        }

        let mut campaign = Campaign::new();
        for (key, value) in table {
            let values = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| scalar_to_string(key, item))
                    .collect::<Result<Vec<_>>>()?,
                scalar => vec![scalar_to_string(key, scalar)?],
            };
            if values.is_empty() {
                return Err(CliError::Config(format!(
                    "Campaign field `{}` has no values.",
                    key
                )));
            }
            campaign.push(key.as_str(), values);
        }
        Ok(campaign)
    }

    pub fn engine(&self, args: &WorkerArgs) -> Result<CommandEngine> {
        let file = self.engine.clone().unwrap_or_default();
        let program = args.program.clone().or(file.program).ok_or_else(|| {
            CliError::Config(
                "An integrator program is required either in the config file (`engine.program`) or via --program."
                    .to_string(),
            )
        })?;
        let program_args = if args.program_args.is_empty() {
            file.args.unwrap_or_default()
        } else {
            args.program_args.clone()
        };
        Ok(CommandEngine::new(program, program_args))
    }

    pub fn worker_config(&self, args: &WorkerArgs) -> Result<WorkerConfig> {
        let file = self.worker.clone().unwrap_or_default();
        let workspace = self.workspace(&args.location)?;

        let mut builder = WorkerConfigBuilder::new()
            .workspace_root(workspace.root().to_path_buf())
            .analyze_completed(!args.no_analysis && file.analyze_completed.unwrap_or(true));
        if let Some(n) = args.max_jobs.or(file.max_jobs) {
            builder = builder.max_jobs(n);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn volume_config(&self, args: &VolumeArgs) -> Result<VolumeConfig> {
        let file = self.volume.clone().unwrap_or_default();
        let workspace = self.workspace(&args.location)?;

        VolumeConfigBuilder::new()
            .workspace_root(workspace.root().to_path_buf())
            .prune_non_optimal(args.prune_non_optimal || file.prune_non_optimal.unwrap_or(false))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        // Debug keeps the decimal point, so `1.0` stays `1.0` in job names.
        Value::Float(f) => Ok(format!("{:?}", f)),
        Value::Boolean(b) => Ok(b.to_string()),
        other => Err(CliError::Config(format!(
            "Campaign field `{}` only accepts strings, numbers and booleans, found {}.",
            key,
            other.type_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    const FULL_CONFIG: &str = r#"
workspace = "/runs/argon"

[engine]
program = "lmp-driver"
args = ["--gpu", "--quiet"]

[worker]
max-jobs = 10

[volume]
prune-non-optimal = true

[campaign]
material = "Ar"
ensemble = "nvt"
steps = 20000
volume_scale = [0.9, 1.0, 1.1]
"#;

    fn worker_args(extra: &[&str]) -> WorkerArgs {
        let mut argv = vec!["mdflow", "worker"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Worker(args) => args,
            other => panic!("Expected 'worker' subcommand, got {other:?}"),
        }
    }

    #[test]
    fn campaign_keeps_declaration_order_and_formats_values() {
        let config = PartialAppConfig::from_toml(FULL_CONFIG).unwrap();
        let campaign = config.campaign().unwrap();
        let keys: Vec<&str> = campaign.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["material", "ensemble", "steps", "volume_scale"]);
        assert_eq!(campaign.fields()[2].1, vec!["20000"]);
        assert_eq!(campaign.fields()[3].1, vec!["0.9", "1.0", "1.1"]);

        let names: Vec<String> = campaign.expand().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["Ar_nvt_20000_0.9", "Ar_nvt_20000_1.0", "Ar_nvt_20000_1.1"]
        );
    }

    #[test]
    fn missing_or_nested_campaign_values_are_rejected() {
        let config = PartialAppConfig::from_toml("workspace = \"/runs\"").unwrap();
        assert!(matches!(config.campaign(), Err(CliError::Config(_))));

        let nested = PartialAppConfig::from_toml("[campaign]\nmaterial = [[\"Cu\"]]").unwrap();
        match nested.campaign() {
            Err(CliError::Config(msg)) => assert!(msg.contains("material")),
            other => panic!("unexpected result: {other:?}"),
        }

        let empty = PartialAppConfig::from_toml("[campaign]\nmaterial = []").unwrap();
        assert!(matches!(empty.campaign(), Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = PartialAppConfig::from_toml("[engine]\nbinary = \"lmp\"");
        assert!(result.is_err());
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let config = PartialAppConfig::from_toml(FULL_CONFIG).unwrap();
        let args = worker_args(&[
            "-w", "/scratch/run", "--program", "other", "--arg", "-x", "-n", "2",
        ]);

        let engine = config.engine(&args).unwrap();
        assert_eq!(engine, CommandEngine::new("other", vec!["-x".to_string()]));

        let worker = config.worker_config(&args).unwrap();
        assert_eq!(worker.workspace.root(), Path::new("/scratch/run"));
        assert_eq!(worker.max_jobs, Some(2));
        assert!(worker.analyze_completed);
    }

    #[test]
    fn file_values_fill_in_missing_arguments() {
        let config = PartialAppConfig::from_toml(FULL_CONFIG).unwrap();
        let args = worker_args(&["--no-analysis"]);

        let engine = config.engine(&args).unwrap();
        assert_eq!(
            engine,
            CommandEngine::new("lmp-driver", vec!["--gpu".into(), "--quiet".into()])
        );

        let worker = config.worker_config(&args).unwrap();
        assert_eq!(worker.workspace.root(), Path::new("/runs/argon"));
        assert_eq!(worker.max_jobs, Some(10));
        assert!(!worker.analyze_completed);
    }

    #[test]
    fn worker_without_program_or_workspace_is_a_config_error() {
        let config = PartialAppConfig::default();
        let args = worker_args(&[]);
        assert!(matches!(config.engine(&args), Err(CliError::Config(_))));
        assert!(matches!(config.worker_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn zero_job_limit_is_rejected_by_the_builder() {
        let config = PartialAppConfig::from_toml("workspace = \"/runs\"").unwrap();
        let args = worker_args(&["-n", "0"]);
        match config.worker_config(&args) {
            Err(CliError::Config(msg)) => assert!(msg.contains("max_jobs")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn volume_pruning_comes_from_file_or_flag() {
        let config = PartialAppConfig::from_toml(FULL_CONFIG).unwrap();
        let args = match Cli::parse_from(["mdflow", "volume"]).command {
            Commands::Volume(args) => args,
            other => panic!("Expected 'volume' subcommand, got {other:?}"),
        };
        assert!(config.volume_config(&args).unwrap().prune_non_optimal);

        let bare = PartialAppConfig::from_toml("workspace = \"/runs\"").unwrap();
        assert!(!bare.volume_config(&args).unwrap().prune_non_optimal);
    }

    #[test]
    fn from_file_reports_the_failing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("campaign.toml");
        fs::write(&path, "[campaign\nmaterial = \"Cu\"").unwrap();
        match PartialAppConfig::from_file(&path) {
            Err(CliError::FileParsing { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
