//! Pure numerical reductions of simulation output.
//!
//! Nothing in this module touches the filesystem except [`pipeline::evaluate_descriptor`],
//! which loads a job's outputs before handing them to the pure functions.

pub mod average;
pub mod eos;
pub mod equilibrium;
pub mod lindemann;
pub mod msd;
pub mod pipeline;
pub mod thermal;
pub mod units;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Series is empty")]
    EmptySeries,
    #[error("Trajectory has no frames")]
    EmptyTrajectory,
    #[error("Equilibration index {index} leaves no samples in a series of length {len}")]
    EmptyWindow { index: usize, len: usize },
    #[error("Frame {frame} has {found} atoms, expected {expected}")]
    AtomCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Temperature must be positive, got {0} K")]
    NonPositiveTemperature(f64),
    #[error("Total mass must be positive, got {0} u")]
    NonPositiveMass(f64),
    #[error("Heat capacity must be positive, got {0} J/(K*kg)")]
    NonPositiveHeatCapacity(f64),
    #[error("Kinetic energy fluctuations exceed the canonical bound; heat capacity diverges")]
    DivergentHeatCapacity,
}
