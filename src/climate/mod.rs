//! Climate history: the erfc correction engine, instrumental-record
//! aggregation and single-epoch uncertainty envelopes.

pub mod correction;
pub mod envelope;
pub mod instrumental;

pub use correction::*;
pub use envelope::*;
pub use instrumental::*;
