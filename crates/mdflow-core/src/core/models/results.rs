use super::frame::{CellParameters, LatticeFamily};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const EQUILIBRIUM_WARNING: &str = "Warning: Equilibrium detected close to the end of the \
     simulation (last 10%). True equilibrium might not have been reached.";
pub const DEBYE_WARNING: &str = "Warning: Debye temperature is low compared to the \
     temperature. The calculated value for debye temperature might not be accurate.";

/// Equilibrium observables derived from one completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub job_name: String,
    pub equilibration_index: usize,
    pub equilibrium_warning: bool,
    pub equilibrium_temperature: f64,
    /// Mean square displacement averaged over the equilibrium window (Å²).
    pub msd_average: f64,
    /// Self-diffusion coefficient in Å² per sampled step.
    pub self_diffusion_coefficient: f64,
    /// Specific heat capacity in J/(K·kg).
    pub heat_capacity: f64,
    pub debye_temperature: f64,
    pub debye_warning: bool,
    /// Cohesive energy in eV/atom.
    pub cohesive_energy: f64,
}

/// The crystallographic outcome of a volume-series fit.
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeParameter {
    Constant(f64),
    /// The lattice family was not recognized; the optimal member's raw cell is reported.
    RawCell(CellParameters),
    /// The fit failed or there was too little data.
    Undefined,
}

/// The result of one volume series.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub group_label: String,
    pub members: usize,
    pub optimal_job: Option<String>,
    pub optimal_trajectory: Option<PathBuf>,
    pub equilibrium_volume: f64,
    pub lattice_family: Option<LatticeFamily>,
    pub lattice: LatticeParameter,
    /// Bulk modulus in GPa.
    pub bulk_modulus: f64,
    pub diagnostics: Vec<String>,
    pub lindemann_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowKind {
    SinglePoint,
    VolumeAggregate,
    Failed,
}

/// One row of a result table.
///
/// Single-point and volume-aggregate results share the same fixed set of columns;
/// columns a kind does not produce are left blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub kind: RowKind,
    pub name: String,
    pub equilibration_index: Option<usize>,
    pub equilibrium_temperature: Option<f64>,
    pub msd_average: Option<f64>,
    pub self_diffusion_coefficient: Option<f64>,
    pub heat_capacity: Option<f64>,
    pub debye_temperature: Option<f64>,
    pub cohesive_energy: Option<f64>,
    pub equilibrium_warning: Option<String>,
    pub debye_warning: Option<String>,
    pub trajectory_file: Option<String>,
    pub lattice_family: Option<String>,
    pub equilibrium_volume: Option<f64>,
    pub lattice_constant: Option<f64>,
    pub cell_parameters: Option<String>,
    pub bulk_modulus: Option<f64>,
    pub lindemann: Option<String>,
    pub error_message: Option<String>,
}

impl ResultRow {
    fn blank(kind: RowKind, name: String) -> Self {
        Self {
            kind,
            name,
            equilibration_index: None,
            equilibrium_temperature: None,
            msd_average: None,
            self_diffusion_coefficient: None,
            heat_capacity: None,
            debye_temperature: None,
            cohesive_energy: None,
            equilibrium_warning: None,
            debye_warning: None,
            trajectory_file: None,
            lattice_family: None,
            equilibrium_volume: None,
            lattice_constant: None,
            cell_parameters: None,
            bulk_modulus: None,
            lindemann: None,
            error_message: None,
        }
    }

    /// A row for a job whose simulation finished but whose post-processing did not.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut row = Self::blank(RowKind::Failed, name.into());
        row.error_message = Some(message.into());
        row
    }
}

impl From<&SimulationResult> for ResultRow {
    fn from(r: &SimulationResult) -> Self {
        let mut row = Self::blank(RowKind::SinglePoint, r.job_name.clone());
        row.equilibration_index = Some(r.equilibration_index);
        row.equilibrium_temperature = Some(r.equilibrium_temperature);
        row.msd_average = Some(r.msd_average);
        row.self_diffusion_coefficient = Some(r.self_diffusion_coefficient);
        row.heat_capacity = Some(r.heat_capacity);
        row.debye_temperature = Some(r.debye_temperature);
        row.cohesive_energy = Some(r.cohesive_energy);
        row.equilibrium_warning = r.equilibrium_warning.then(|| EQUILIBRIUM_WARNING.to_string());
        row.debye_warning = r.debye_warning.then(|| DEBYE_WARNING.to_string());
        row
    }
}

impl From<&AggregateResult> for ResultRow {
    fn from(r: &AggregateResult) -> Self {
        let mut row = Self::blank(RowKind::VolumeAggregate, r.group_label.clone());
        row.trajectory_file = r
            .optimal_trajectory
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        row.lattice_family = r.lattice_family.map(|f| f.to_string());
        row.equilibrium_volume = Some(r.equilibrium_volume);
        row.bulk_modulus = Some(r.bulk_modulus);
        match &r.lattice {
            LatticeParameter::Constant(a) => row.lattice_constant = Some(*a),
            LatticeParameter::RawCell(params) => row.cell_parameters = Some(params.to_string()),
            LatticeParameter::Undefined => row.lattice_constant = Some(f64::NAN),
        }
        row.lindemann = r.lindemann_message.clone().filter(|m| !m.is_empty());
        if !r.diagnostics.is_empty() {
            row.error_message = Some(r.diagnostics.join(" "));
        }
        row
    }
}
