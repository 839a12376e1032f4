//! Reading and writing the files exchanged with the external integrator and with
//! downstream consumers.
//!
//! Trajectories go through the [`traits::TrajectoryFile`] interface so that the analysis
//! layer never depends on one concrete layout; extended XYZ ([`xyz`]) is the format
//! shipped here. Scalar series ([`series`]) and result tables ([`table`]) are CSV.

pub mod series;
pub mod table;
pub mod traits;
pub mod xyz;
