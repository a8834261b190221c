//! Monte Carlo uncertainty propagation.
//!
//! - `perturb`: one iteration's random draws and the corrections they imply
//! - `driver`: parallel iteration loop and the deterministic reference pass
//! - `aggregate`: reduction into a [`crate::domain::SimulationResult`]

pub mod aggregate;
pub mod driver;
pub mod perturb;

pub use aggregate::*;
pub use driver::*;
pub use perturb::*;
