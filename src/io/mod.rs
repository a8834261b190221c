//! Input/output helpers.
//!
//! - borehole CSV ingest + validation (`borehole`)
//! - palaeoclimate and instrumental histories (`palaeo`, `instrumental`)
//! - result exports (CSV/JSON) (`export`)

pub mod borehole;
pub mod export;
pub mod instrumental;
pub mod palaeo;
pub mod table;

pub use borehole::*;
pub use export::*;
pub use instrumental::*;
pub use palaeo::*;
pub use table::RowError;
