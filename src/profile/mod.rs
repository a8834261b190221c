//! Borehole profile transforms: temperature interpolation and thermal resistance.

pub mod interpolate;
pub mod resistance;

pub use interpolate::*;
pub use resistance::*;
