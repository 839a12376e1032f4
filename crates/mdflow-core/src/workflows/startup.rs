use crate::core::models::job::{DESCRIPTOR_EXTENSION, JobDescriptor, job_name_from_values};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::workspace::Workspace;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// An ordered set of configuration fields, each with one or more values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Campaign {
    fields: Vec<(String, Vec<String>)>,
}

/// One parameter combination of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub parameters: Vec<(String, String)>,
}

impl Campaign {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.push(key, values);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.fields.push((key.into(), values));
    }

    pub fn fields(&self) -> &[(String, Vec<String>)] {
        &self.fields
    }

    /// Number of combinations [`Campaign::expand`] yields.
    pub fn job_count(&self) -> usize {
        if self.fields.is_empty() {
            return 0;
        }
        self.fields.iter().map(|(_, values)| values.len()).product()
    }

    /// Cartesian product of all field values; the first field varies slowest.
    pub fn expand(&self) -> Vec<JobSpec> {
        let total = self.job_count();
        let mut specs = Vec::with_capacity(total);
        let mut odometer = vec![0usize; self.fields.len()];

        for _ in 0..total {
            let parameters: Vec<(String, String)> = self
                .fields
                .iter()
                .zip(&odometer)
                .map(|((key, values), &i)| (key.clone(), values[i].clone()))
                .collect();
            let name = job_name_from_values(parameters.iter().map(|(_, v)| v.as_str()));
            specs.push(JobSpec { name, parameters });

            for (digit, (_, values)) in odometer.iter_mut().zip(&self.fields).rev() {
                *digit += 1;
                if *digit < values.len() {
                    break;
                }
                *digit = 0;
            }
        }
        specs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupSummary {
    pub written: Vec<PathBuf>,
    /// Jobs already present in some store of the workspace.
    pub skipped: Vec<String>,
}

/// Prepares the workspace and queues one descriptor per campaign combination.
///
/// Re-running with the same campaign only queues combinations the workspace has never
/// seen.
#[instrument(skip_all, name = "startup_workflow")]
pub fn run(
    workspace: &Workspace,
    campaign: &Campaign,
    reporter: &ProgressReporter,
) -> Result<StartupSummary, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparing workspace",
    });
    workspace.prepare()?;
    reporter.report(Progress::PhaseFinish);

    let specs = campaign.expand();
    info!(jobs = specs.len(), root = %workspace.root().display(), "Expanding campaign");
    reporter.report(Progress::TaskStart {
        total_steps: specs.len() as u64,
    });

    let mut summary = StartupSummary::default();
    let stores = [workspace.unbegun(), workspace.started(), workspace.done()];
    for spec in specs {
        let file_name = format!("{}.{DESCRIPTOR_EXTENSION}", spec.name);
        if stores.iter().any(|store| store.join(&file_name).exists()) {
            warn!(job = %spec.name, "Job already exists in the workspace; skipping");
            summary.skipped.push(spec.name);
            reporter.report(Progress::TaskIncrement);
            continue;
        }
        let descriptor = JobDescriptor::from_parameters(workspace.root(), &spec.name, &spec.parameters)?;
        let path = workspace.unbegun().join(file_name);
        descriptor.save(&path)?;
        summary.written.push(path);
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "Campaign queued"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_field_varies_slowest() {
        let campaign = Campaign::new()
            .field("a", values(&["A", "B"]))
            .field("b", values(&["1", "2"]));
        let names: Vec<String> = campaign.expand().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["A_1", "A_2", "B_1", "B_2"]);
    }

    #[test]
    fn empty_value_list_yields_no_jobs() {
        let campaign = Campaign::new()
            .field("a", values(&["A"]))
            .field("b", Vec::new());
        assert_eq!(campaign.job_count(), 0);
        assert!(campaign.expand().is_empty());
        assert!(Campaign::new().expand().is_empty());
    }

    #[test]
    fn parameters_keep_declaration_order() {
        let campaign = Campaign::new()
            .field("material", values(&["Cu"]))
            .field("ensemble", values(&["nve"]))
            .field("volume_scale", values(&["0.9", "1.1"]));
        let specs = campaign.expand();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].name, "Cu_nve_1.1");
        assert_eq!(
            specs[1].parameters,
            vec![
                ("material".to_string(), "Cu".to_string()),
                ("ensemble".to_string(), "nve".to_string()),
                ("volume_scale".to_string(), "1.1".to_string()),
            ]
        );
    }

    #[test]
    fn run_writes_descriptors_and_skips_known_jobs() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let campaign = Campaign::new()
            .field("material", values(&["Cu", "Ar"]))
            .field("ensemble", values(&["nvt"]))
            .field("steps", values(&["1000"]))
            .field("temperature", values(&["300"]));
        let reporter = ProgressReporter::new();

        let summary = run(&workspace, &campaign, &reporter).unwrap();
        assert_eq!(summary.written.len(), 2);
        workspace.validate().unwrap();

        let descriptor =
            JobDescriptor::load(&workspace.unbegun().join("Cu_nvt_1000_300.json")).unwrap();
        assert_eq!(descriptor.material, dir.path().join("materials/Cu.xyz"));
        assert_eq!(descriptor.temperature, Some(300.0));
        assert_eq!(
            descriptor.traj_output_path,
            dir.path().join("output/traj/Cu_nvt_1000_300.xyz")
        );

        std::fs::rename(
            workspace.unbegun().join("Ar_nvt_1000_300.json"),
            workspace.done().join("Ar_nvt_1000_300.json"),
        )
        .unwrap();
        let rerun = run(&workspace, &campaign, &reporter).unwrap();
        assert!(rerun.written.is_empty());
        assert_eq!(rerun.skipped, vec!["Cu_nvt_1000_300", "Ar_nvt_1000_300"]);
    }

    #[test]
    fn invalid_parameter_aborts_startup() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let campaign = Campaign::new()
            .field("material", values(&["Cu"]))
            .field("ensemble", values(&["npt"]))
            .field("steps", values(&["10"]));
        let result = run(&workspace, &campaign, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Descriptor { .. })));
    }
}
