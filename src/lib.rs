//! `borehole-heatflow` library crate.
//!
//! The binary (`heatflow`) is a thin wrapper around this library so that:
//!
//! - the numerical pipeline is testable without spawning processes
//! - per-borehole entry points can be driven by other front-ends

pub mod app;
pub mod cli;
pub mod climate;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod profile;
pub mod report;
pub mod simulation;
