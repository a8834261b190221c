use thiserror::Error;

/// Numerical failures of the heat-flow pipeline.
///
/// Loading anomalies never show up here: they are trimmed by the loaders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeatFlowError {
    #[error("insufficient data: need {needed} points, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("target depth {depth} m cannot be aligned with the measured depths ({reason})")]
    MismatchedDepths { depth: f64, reason: String },

    #[error("regression is underdetermined: {distinct} distinct resistance value(s)")]
    UnderdeterminedFit { distinct: usize },

    #[error("epoch {index} ends at {t_end} s but starts at {t_start} s (end must be more recent)")]
    InvalidEpochOrdering { index: usize, t_start: f64, t_end: f64 },

    #[error("{quantity} = {value} is outside its physical domain (bound {bound})")]
    NumericDomain {
        quantity: &'static str,
        value: f64,
        bound: f64,
    },
}

impl HeatFlowError {
    /// Short machine-friendly label used in per-borehole failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            HeatFlowError::InsufficientData { .. } => "InsufficientDataError",
            HeatFlowError::MismatchedDepths { .. } => "MismatchedDepthsError",
            HeatFlowError::UnderdeterminedFit { .. } => "UnderdeterminedFitError",
            HeatFlowError::InvalidEpochOrdering { .. } => "InvalidEpochOrderingError",
            HeatFlowError::NumericDomain { .. } => "NumericDomainError",
        }
    }

    fn exit_code(&self) -> u8 {
        match self {
            HeatFlowError::InsufficientData { .. } | HeatFlowError::MismatchedDepths { .. } => 3,
            HeatFlowError::InvalidEpochOrdering { .. } => 2,
            HeatFlowError::UnderdeterminedFit { .. } | HeatFlowError::NumericDomain { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Wrap a pipeline failure so the borehole is reported by name and error kind.
    pub fn for_borehole(name: &str, err: HeatFlowError) -> Self {
        Self::new(
            err.exit_code(),
            format!("borehole '{name}' failed [{}]: {err}", err.kind()),
        )
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<HeatFlowError> for AppError {
    fn from(err: HeatFlowError) -> Self {
        Self::new(err.exit_code(), format!("[{}] {err}", err.kind()))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borehole_failure_names_borehole_and_kind() {
        let err = AppError::for_borehole("BH-7", HeatFlowError::UnderdeterminedFit { distinct: 1 });
        assert_eq!(err.exit_code(), 4);
        let msg = err.to_string();
        assert!(msg.contains("BH-7"), "{msg}");
        assert!(msg.contains("UnderdeterminedFitError"), "{msg}");
    }
}
