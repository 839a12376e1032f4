//! Data structures describing simulation input, output, and derived results.
//!
//! - [`frame`] - A single structural snapshot and its periodic cell
//! - [`trajectory`] - An ordered sequence of frames
//! - [`series`] - Per-sample scalar observables written by the integrator
//! - [`job`] - The job descriptor that parameterizes one simulation
//! - [`results`] - Per-job and per-volume-group result records and the shared table row

pub mod frame;
pub mod job;
pub mod results;
pub mod series;
pub mod trajectory;
