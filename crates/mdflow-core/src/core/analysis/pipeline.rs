use super::AnalysisError;
use super::average::window_mean;
use super::equilibrium::{
    Equilibration, EquilibrationDetector, StatisticalInefficiencyDetector, SteadyStateDetector,
};
use super::msd::{MsdReference, mean_square_displacement, self_diffusion_coefficient};
use super::thermal::{
    DebyeTemperature, cohesive_energy, constant_energy_heat_capacity,
    constant_temperature_heat_capacity, debye_temperature,
};
use crate::core::io::series::{SeriesError, read_series_from_path};
use crate::core::io::traits::TrajectoryFile;
use crate::core::io::xyz::{XyzError, XyzFile};
use crate::core::models::job::{DescriptorError, Ensemble, JobDescriptor};
use crate::core::models::results::SimulationResult;
use crate::core::models::series::ScalarSeries;
use crate::core::models::trajectory::Trajectory;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("Failed to read trajectory '{path}': {source}")]
    Trajectory {
        path: PathBuf,
        #[source]
        source: XyzError,
    },
    #[error("Failed to read scalar series '{path}': {source}")]
    Series {
        path: PathBuf,
        #[source]
        source: SeriesError,
    },
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// The raw outputs one simulation left behind.
#[derive(Debug, Clone)]
pub struct JobOutputs {
    pub trajectory: Trajectory,
    pub series: ScalarSeries,
}

impl JobOutputs {
    pub fn load(descriptor: &JobDescriptor) -> Result<Self, PipelineError> {
        let trajectory = XyzFile::read_from_path(&descriptor.traj_output_path).map_err(|source| {
            PipelineError::Trajectory {
                path: descriptor.traj_output_path.clone(),
                source,
            }
        })?;
        let series = read_series_from_path(&descriptor.csv_output_path).map_err(|source| {
            PipelineError::Series {
                path: descriptor.csv_output_path.clone(),
                source,
            }
        })?;
        Ok(Self { trajectory, series })
    }
}

/// Reduces one job's trajectory and scalar series to its equilibrium observables.
///
/// Every observable uses the same equilibration index, detected once on the
/// ensemble's conserved-quantity proxy: temperature for constant energy, potential
/// energy for constant temperature. The trajectory and the series are expected to be
/// sampled at the same interval.
#[derive(Debug, Clone, Default)]
pub struct PhysicalQuantityPipeline<D = StatisticalInefficiencyDetector> {
    detector: EquilibrationDetector<D>,
}

impl PhysicalQuantityPipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: SteadyStateDetector> PhysicalQuantityPipeline<D> {
    pub fn with_detector(detector: D) -> Self {
        Self {
            detector: EquilibrationDetector::new(detector),
        }
    }

    pub fn equilibration(
        &self,
        ensemble: Ensemble,
        outputs: &JobOutputs,
    ) -> Result<Equilibration, AnalysisError> {
        match ensemble {
            Ensemble::Nve => self.detector.detect(&outputs.series.temperature),
            Ensemble::Nvt => self
                .detector
                .detect(&outputs.trajectory.potential_energies()),
        }
    }

    pub fn evaluate(
        &self,
        job_name: &str,
        ensemble: Ensemble,
        outputs: &JobOutputs,
    ) -> Result<SimulationResult, AnalysisError> {
        let trajectory = &outputs.trajectory;
        let first = trajectory.first().ok_or(AnalysisError::EmptyTrajectory)?;
        let atoms = first.atom_count();
        let total_mass = first.total_mass();

        let equilibration = self.equilibration(ensemble, outputs)?;
        let t0 = equilibration.index;
        let temperature =
            window_mean(t0, &outputs.series.temperature).ok_or(AnalysisError::EmptyWindow {
                index: t0,
                len: outputs.series.len(),
            })?;

        let msd = mean_square_displacement(trajectory, MsdReference::Initial)?;
        let msd_average = window_mean(t0, &msd).ok_or(AnalysisError::EmptyWindow {
            index: t0,
            len: msd.len(),
        })?;
        let diffusion = self_diffusion_coefficient(&msd, t0)?;

        let heat_capacity = match ensemble {
            Ensemble::Nve => constant_energy_heat_capacity(
                &trajectory.kinetic_energies(),
                t0,
                temperature,
                atoms,
                total_mass,
            )?,
            Ensemble::Nvt => constant_temperature_heat_capacity(
                &trajectory.total_energies(),
                t0,
                temperature,
                total_mass,
            )?,
        };

        let debye = match debye_temperature(temperature, atoms, total_mass, heat_capacity) {
            Ok(debye) => debye,
            Err(AnalysisError::NonPositiveHeatCapacity(value)) => {
                warn!(job = job_name, heat_capacity = value, "Debye temperature undefined");
                DebyeTemperature {
                    value: f64::NAN,
                    warning: false,
                }
            }
            Err(e) => return Err(e),
        };

        let cohesive = cohesive_energy(&trajectory.potential_energies(), t0, atoms)?;

        debug!(job = job_name, t0, temperature, heat_capacity, "Job evaluated");
        Ok(SimulationResult {
            job_name: job_name.to_string(),
            equilibration_index: t0,
            equilibrium_warning: equilibration.warning,
            equilibrium_temperature: temperature,
            msd_average,
            self_diffusion_coefficient: diffusion,
            heat_capacity,
            debye_temperature: debye.value,
            debye_warning: debye.warning,
            cohesive_energy: cohesive,
        })
    }

    /// Loads the outputs a descriptor points at and evaluates them.
    pub fn evaluate_descriptor(
        &self,
        job_name: &str,
        descriptor_path: &Path,
    ) -> Result<SimulationResult, PipelineError> {
        let descriptor = JobDescriptor::load(descriptor_path)?;
        let outputs = JobOutputs::load(&descriptor)?;
        Ok(self.evaluate(job_name, descriptor.ensemble, &outputs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::units::{BOLTZMANN_EV, ELEMENTARY_CHARGE, amu_to_kg};
    use crate::core::models::frame::{Cell, Frame};
    use nalgebra::Point3;

    struct StartAt(usize);

    impl SteadyStateDetector for StartAt {
        fn detect(&self, _series: &[f64]) -> usize {
            self.0
        }
    }

    fn outputs(samples: usize) -> JobOutputs {
        let mut frames = Vec::new();
        let mut series = ScalarSeries::default();
        for i in 0..samples {
            let shift = 0.1 * i as f64;
            let kinetic = if i % 2 == 0 { 0.0386 } else { 0.0390 };
            let potential = -4.0 + if i % 2 == 0 { 0.002 } else { -0.002 };
            frames.push(Frame {
                symbols: vec!["Ar".into(), "Ar".into()],
                positions: vec![
                    Point3::new(1.0 + shift, 1.0, 1.0),
                    Point3::new(4.0, 4.0 - shift, 4.0),
                ],
                masses: vec![39.948, 39.948],
                cell: Cell::cubic(10.0),
                potential_energy: potential,
                kinetic_energy: kinetic,
            });
            series.push_sample(i as f64, potential, kinetic, 0.0, 150.0);
        }
        JobOutputs {
            trajectory: Trajectory::new(frames),
            series,
        }
    }

    #[test]
    fn observables_share_one_equilibration_window() {
        let pipeline = PhysicalQuantityPipeline::with_detector(StartAt(10));
        let result = pipeline.evaluate("Ar_nve", Ensemble::Nve, &outputs(20)).unwrap();

        assert_eq!(result.job_name, "Ar_nve");
        assert_eq!(result.equilibration_index, 10);
        assert!(!result.equilibrium_warning);
        assert_eq!(result.equilibrium_temperature, 150.0);
        // Each atom moves 0.1 Å per sample along one axis.
        let expected_msd = (10..20).map(|i| (0.1 * i as f64).powi(2)).sum::<f64>() / 10.0;
        assert!((result.msd_average - expected_msd).abs() < 1e-9);
        let expected_diffusion = (1.9f64.powi(2) - 1.0) / (6.0 * 10.0);
        assert!((result.self_diffusion_coefficient - expected_diffusion).abs() < 1e-9);
        assert!((result.cohesive_energy - 2.0).abs() < 1e-9);
        assert!(result.heat_capacity > 0.0);
        assert!(result.debye_temperature.is_finite());
    }

    #[test]
    fn canonical_ensemble_uses_total_energy_fluctuations() {
        let pipeline = PhysicalQuantityPipeline::with_detector(StartAt(0));
        let data = outputs(40);
        let result = pipeline.evaluate("Ar_nvt", Ensemble::Nvt, &data).unwrap();
        // Total energy alternates by ±0.0018 eV around its mean.
        let variance = 0.0018f64.powi(2);
        let expected = variance / (BOLTZMANN_EV * 150.0 * 150.0) * ELEMENTARY_CHARGE
            / amu_to_kg(2.0 * 39.948);
        assert!(((result.heat_capacity - expected) / expected).abs() < 1e-6);
        // t0 is clamped to 5% of 40 samples.
        assert_eq!(result.equilibration_index, 2);
    }

    #[test]
    fn empty_trajectory_fails() {
        let pipeline = PhysicalQuantityPipeline::new();
        let data = JobOutputs {
            trajectory: Trajectory::default(),
            series: ScalarSeries::default(),
        };
        assert_eq!(
            pipeline.evaluate("x", Ensemble::Nve, &data),
            Err(AnalysisError::EmptyTrajectory)
        );
    }
}
