use super::{CompletedJob, load_completed_jobs};
use crate::core::analysis::AnalysisError;
use crate::core::analysis::average::window_mean;
use crate::core::analysis::eos::{self, EosError, MIN_POINTS};
use crate::core::analysis::lindemann;
use crate::core::analysis::msd::{MsdReference, mean_square_displacement};
use crate::core::analysis::pipeline::{JobOutputs, PhysicalQuantityPipeline, PipelineError};
use crate::core::io::table::{timestamped_table_path, write_rows_to_path};
use crate::core::models::frame::LatticeFamily;
use crate::core::models::results::{AggregateResult, LatticeParameter, ResultRow};
use crate::engine::config::VolumeConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const TABLE_PREFIX: &str = "volume_process";

pub const LINDEMANN_SKIPPED: &str =
    "Lindemann criterion not evaluated: the lattice constant is undefined.";

/// Completed jobs that differ only in their volume scale.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGroup {
    pub members: Vec<CompletedJob>,
}

impl VolumeGroup {
    /// The `_`-separated name segments shared by every member.
    pub fn label(&self) -> String {
        let Some(first) = self.members.first() else {
            return String::new();
        };
        let reference: Vec<&str> = first.name.split('_').collect();
        let names: Vec<Vec<&str>> = self
            .members
            .iter()
            .map(|m| m.name.split('_').collect())
            .collect();
        if names.iter().any(|n| n.len() != reference.len()) {
            return first.name.clone();
        }
        reference
            .iter()
            .enumerate()
            .filter(|(i, segment)| names.iter().all(|n| n[*i] == **segment))
            .map(|(_, segment)| *segment)
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Partitions completed jobs into volume series.
///
/// Each job is compared against the first member of every existing group and joins the
/// first group that matches. Jobs without a volume scale are returned separately as
/// single points.
pub fn group_by_volume(jobs: Vec<CompletedJob>) -> (Vec<VolumeGroup>, Vec<CompletedJob>) {
    let mut groups: Vec<VolumeGroup> = Vec::new();
    let mut single_points = Vec::new();
    for job in jobs {
        if job.descriptor.volume_scale.is_none() {
            single_points.push(job);
            continue;
        }
        match groups
            .iter_mut()
            .find(|g| g.members[0].descriptor.is_volume_equivalent(&job.descriptor))
        {
            Some(group) => group.members.push(job),
            None => groups.push(VolumeGroup { members: vec![job] }),
        }
    }
    (groups, single_points)
}

struct VolumePoint {
    member: usize,
    volume: f64,
    energy: f64,
}

fn measure(
    pipeline: &PhysicalQuantityPipeline,
    job: &CompletedJob,
) -> Result<(f64, f64), PipelineError> {
    let outputs = JobOutputs::load(&job.descriptor)?;
    let t0 = pipeline
        .equilibration(job.descriptor.ensemble, &outputs)?
        .index;
    let window = |values: Vec<f64>| {
        let len = values.len();
        window_mean(t0, &values).ok_or(AnalysisError::EmptyWindow { index: t0, len })
    };
    let volume = window(outputs.trajectory.volumes())?;
    let energy = window(outputs.trajectory.potential_energies())?;
    Ok((volume, energy))
}

/// Lindemann assessment of the optimal member, using its own equilibrium window.
fn assess_melting(
    pipeline: &PhysicalQuantityPipeline,
    job: &CompletedJob,
    lattice_constant: f64,
    family: LatticeFamily,
) -> Result<String, PipelineError> {
    let outputs = JobOutputs::load(&job.descriptor)?;
    let t0 = pipeline
        .equilibration(job.descriptor.ensemble, &outputs)?
        .index;
    let msd = mean_square_displacement(&outputs.trajectory, MsdReference::Initial)?;
    let msd_average = window_mean(t0, &msd).ok_or(AnalysisError::EmptyWindow {
        index: t0,
        len: msd.len(),
    })?;
    let assessment = lindemann::assess(lattice_constant, &msd, msd_average, family);
    debug!(
        job = %job.name,
        parameter = assessment.equilibrium_parameter,
        melted = assessment.melted,
        "Lindemann criterion evaluated"
    );
    Ok(assessment.message())
}

/// Fits the equation of state of one volume series and derives its lattice properties.
///
/// Failures are recorded as diagnostics on the result; they never abort the batch.
pub fn aggregate_group(group: &VolumeGroup, pipeline: &PhysicalQuantityPipeline) -> AggregateResult {
    let mut result = AggregateResult {
        group_label: group.label(),
        members: group.members.len(),
        optimal_job: None,
        optimal_trajectory: None,
        equilibrium_volume: f64::NAN,
        lattice_family: None,
        lattice: LatticeParameter::Undefined,
        bulk_modulus: f64::NAN,
        diagnostics: Vec::new(),
        lindemann_message: None,
    };
    let insufficient = |found: usize| {
        EosError::InsufficientData {
            found,
            required: MIN_POINTS,
        }
        .to_string()
    };

    if group.members.len() < MIN_POINTS {
        result.diagnostics.push(insufficient(group.members.len()));
        result.lindemann_message = Some(LINDEMANN_SKIPPED.to_string());
        return result;
    }

    let mut points = Vec::with_capacity(group.members.len());
    for (member, job) in group.members.iter().enumerate() {
        match measure(pipeline, job) {
            Ok((volume, energy)) => points.push(VolumePoint {
                member,
                volume,
                energy,
            }),
            Err(e) => {
                warn!(job = %job.name, error = %e, "Volume-series member skipped");
                result
                    .diagnostics
                    .push(format!("Member '{}' skipped: {}.", job.name, e));
            }
        }
    }

    let volumes: Vec<f64> = points.iter().map(|p| p.volume).collect();
    let energies: Vec<f64> = points.iter().map(|p| p.energy).collect();
    let fit = match eos::fit_sjeos(&volumes, &energies) {
        Ok(fit) => fit,
        Err(e) => {
            warn!(group = %result.group_label, error = %e, "Equation of state fit failed");
            result.diagnostics.push(match e {
                EosError::InsufficientData { found, .. } => insufficient(found),
                other => format!(
                    "Bulk modulus and lattice constant could not be calculated: {other}."
                ),
            });
            result.lindemann_message = Some(LINDEMANN_SKIPPED.to_string());
            return result;
        }
    };
    result.equilibrium_volume = fit.equilibrium_volume;
    result.bulk_modulus = fit.bulk_modulus_gpa();

    let Some(optimal) = points.iter().min_by(|a, b| {
        (a.volume - fit.equilibrium_volume)
            .abs()
            .total_cmp(&(b.volume - fit.equilibrium_volume).abs())
    }) else {
        return result;
    };
    let optimal_job = &group.members[optimal.member];
    result.optimal_job = Some(optimal_job.name.clone());
    result.optimal_trajectory = Some(optimal_job.descriptor.traj_output_path.clone());

    let last_frame = match JobOutputs::load(&optimal_job.descriptor) {
        Ok(outputs) => outputs.trajectory.last().cloned(),
        Err(e) => {
            result.diagnostics.push(format!(
                "Optimal member '{}' could not be reloaded: {}.",
                optimal_job.name, e
            ));
            None
        }
    };
    let Some(frame) = last_frame else {
        result.lindemann_message = Some(LINDEMANN_SKIPPED.to_string());
        return result;
    };

    let family = LatticeFamily::detect(&frame.cell);
    result.lattice_family = Some(family);
    match eos::lattice_constant(family, fit.equilibrium_volume, frame.atom_count()) {
        Some(a) => {
            result.lattice = LatticeParameter::Constant(a);
            match assess_melting(pipeline, optimal_job, a, family) {
                Ok(message) => {
                    result.lindemann_message = Some(message).filter(|m| !m.is_empty());
                }
                Err(e) => {
                    result
                        .diagnostics
                        .push(format!("Lindemann criterion could not be evaluated: {e}."));
                }
            }
        }
        None => {
            result.lattice = LatticeParameter::RawCell(frame.cell.parameters());
            result.diagnostics.push(
                "Lattice structure was not recognized; no lattice constant could be determined \
                 and the raw cell of the optimal member is reported instead."
                    .to_string(),
            );
            result.lindemann_message = Some(LINDEMANN_SKIPPED.to_string());
        }
    }

    result
}

fn remove_if_present(path: &Path, removed: &mut Vec<PathBuf>) -> Result<(), EngineError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            removed.push(path.to_path_buf());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EngineError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Deletes the outputs and descriptors of every member other than the optimal one.
fn prune_non_optimal(
    groups: &[VolumeGroup],
    results: &[AggregateResult],
) -> Result<Vec<PathBuf>, EngineError> {
    let mut removed = Vec::new();
    for (group, result) in groups.iter().zip(results) {
        let Some(optimal) = &result.optimal_job else {
            continue;
        };
        for member in group.members.iter().filter(|m| &m.name != optimal) {
            remove_if_present(&member.descriptor.traj_output_path, &mut removed)?;
            remove_if_present(&member.descriptor.csv_output_path, &mut removed)?;
            remove_if_present(&member.descriptor_path, &mut removed)?;
        }
    }
    Ok(removed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSummary {
    pub table_path: PathBuf,
    pub results: Vec<AggregateResult>,
    /// Completed jobs without a volume scale; they belong to the post-process table.
    pub single_points: Vec<String>,
    pub pruned: Vec<PathBuf>,
}

/// Aggregates every volume series in the done store into one timestamped table.
#[instrument(skip_all, name = "volume_workflow")]
pub fn run(config: &VolumeConfig, reporter: &ProgressReporter) -> Result<VolumeSummary, EngineError> {
    let workspace = &config.workspace;
    workspace.validate()?;
    let jobs = load_completed_jobs(&workspace.done())?;
    let (groups, single_points) = group_by_volume(jobs);
    info!(
        groups = groups.len(),
        single_points = single_points.len(),
        "Grouped completed jobs by volume series"
    );

    let pipeline = PhysicalQuantityPipeline::new();
    reporter.report(Progress::TaskStart {
        total_steps: groups.len() as u64,
    });
    let results: Vec<AggregateResult> = groups
        .iter()
        .map(|group| {
            let result = aggregate_group(group, &pipeline);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();
    reporter.report(Progress::TaskFinish);

    let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
    let table_path = timestamped_table_path(&workspace.post_process_output(), TABLE_PREFIX);
    write_rows_to_path(&rows, &table_path)?;
    info!(path = %table_path.display(), "Volume-series table written");

    let pruned = if config.prune_non_optimal {
        let removed = prune_non_optimal(&groups, &results)?;
        info!(files = removed.len(), "Pruned non-optimal volume-series members");
        removed
    } else {
        Vec::new()
    };

    Ok(VolumeSummary {
        table_path,
        results,
        single_points: single_points.into_iter().map(|j| j.name).collect(),
        pruned,
    })
}
