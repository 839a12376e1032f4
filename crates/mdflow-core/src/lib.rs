//! # mdflow Core Library
//!
//! A batch execution engine for independent molecular-dynamics jobs, together with the
//! statistical post-processing that reduces raw per-timestep output into physical
//! summary quantities and a cross-job volume-series analysis.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Frame`, `Trajectory`,
//!   `ScalarSeries`, `JobDescriptor`), file formats, and the pure numerical analysis
//!   routines (time averaging, equilibration detection, MSD, heat capacity, equation of
//!   state, Lindemann criterion).
//!
//! - **[`engine`]: The Execution Core.** The filesystem-backed work queue, the worker
//!   drain loop that claims, runs, and post-processes jobs, and the interface to the
//!   external simulation program.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the two layers
//!   above: campaign expansion, running a worker, batch post-processing, volume-series
//!   aggregation, and merging partial result tables.
//!
//! Workers never talk to each other. The only shared state is the set of directories
//! inside a workspace, and the only atomic operation is a single file rename.

pub mod core;
pub mod engine;
pub mod workflows;
