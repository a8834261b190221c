//! Mathematical utilities: line least squares and smoothing splines.

pub mod ols;
pub mod spline;

pub use ols::*;
pub use spline::*;
