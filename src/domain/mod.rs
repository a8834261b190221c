//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measured series (`DepthSeries`, `ConductivitySeries`)
//! - climate history (`ClimateEpoch`, `EpochSet`)
//! - derived and aggregated outputs (`ThermalResistanceProfile`, `HeatFlowEstimate`, `SimulationResult`)
//! - run configuration (`SimulationConfig`, `RunConfig`)

pub mod types;

pub use types::*;
