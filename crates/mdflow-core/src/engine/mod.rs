//! # Engine Module
//!
//! Stateful execution of a simulation campaign on a shared filesystem.
//!
//! ## Overview
//!
//! A campaign is a directory tree ([`workspace`]) in which every job is one JSON
//! descriptor. Where a descriptor lives encodes the job's state, so any number of
//! independent worker processes, on any number of hosts, can drain the same campaign
//! with no coordinator: claiming a job is a single atomic rename ([`queue`]).
//!
//! ## Architecture
//!
//! - **Workspace** ([`workspace`]) - Directory layout, creation and validation
//! - **Queue** ([`queue`]) - The [`queue::WorkQueue`] state machine and its directory backing
//! - **Simulation** ([`simulation`]) - The seam to the external integrator
//! - **Worker** ([`worker`]) - The claim/execute drain loop and its result accumulator
//! - **Configuration** ([`config`]) - Builders for worker and volume-processing settings
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error types

pub mod config;
pub mod error;
pub mod progress;
pub mod queue;
pub mod simulation;
pub mod worker;
pub mod workspace;
