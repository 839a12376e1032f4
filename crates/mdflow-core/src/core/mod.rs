//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Data Models** ([`models`]) - Frames, cells, lattice families, scalar series, job
//!   descriptors, and result records
//! - **File I/O** ([`io`]) - Extended XYZ trajectories, scalar-series CSV files, and
//!   result tables
//! - **Analysis** ([`analysis`]) - The numerical reduction pipeline from raw time series
//!   to equilibrium observables
//!
//! Nothing in this module touches the work queue; every function here can be called on
//! data that was produced elsewhere.

pub mod analysis;
pub mod io;
pub mod models;
