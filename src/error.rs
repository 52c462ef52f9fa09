use thiserror::Error;

pub type Result<T> = std::result::Result<T, RdmError>;

/// Configuration errors. These are raised before any datacube is allocated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RdmError {
    #[error("invalid parameter: {name} must be positive and finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("noise figure must be at least 1 (linear), got {0}")]
    NoiseFigureBelowUnity(f64),

    #[error("total losses must be at least 1 (linear), got {0}")]
    LossesBelowUnity(f64),

    #[error("a coherent processing interval needs at least one pulse")]
    ZeroPulses,

    #[error("no Barker code of length {0}, supported lengths are 2, 3, 4, 5, 7, 11 and 13")]
    UnsupportedBarkerLength(usize),

    #[error("coded waveform needs at least one chip")]
    ZeroChips,

    #[error("chirp direction must be nonzero")]
    InvalidChirpDirection,

    #[error("datacube shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Checks that a parameter is strictly positive and finite.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(RdmError::InvalidParameter { name, value })
    }
}
