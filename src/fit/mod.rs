//! Heat flow estimation.
//!
//! Responsibilities:
//!
//! - regress temperature on thermal resistance (OLS / weighted)
//! - orthogonal-distance regression when both axes carry error

pub mod estimator;
pub mod odr;

pub use estimator::*;
pub use odr::*;
