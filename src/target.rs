use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, RdmError, Result};

// A point target at constant range-rate. Both range-rate and RCS are held fixed for a CPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    // Initial slant range, m
    pub range: f64,
    // m/s, positive when opening
    pub range_rate: f64,
    // m^2
    pub rcs: f64,
}

impl TargetInfo {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("target range", self.range)?;
        ensure_positive("target RCS", self.rcs)?;
        if !self.range_rate.is_finite() {
            return Err(RdmError::InvalidParameter {
                name: "target range rate",
                value: self.range_rate,
            });
        }
        Ok(())
    }

    // Dead reckoning, no acceleration.
    pub fn range_at(&self, t: f64) -> f64 {
        self.range + self.range_rate * t
    }

    /// Slant range at the time of each pulse in the CPI, `range + range_rate * i / prf`.
    pub fn range_history(&self, num_pulses: usize, prf: f64) -> Array1<f64> {
        (0..num_pulses)
            .map(|i| self.range_at(i as f64 / prf))
            .collect()
    }
}
