use serde::{Deserialize, Serialize};

use crate::{
    error::{ensure_positive, RdmError, Result},
    helper::wavelength,
};

const c: f64 = 3e8;

pub const SPEED_OF_LIGHT: f64 = c;

pub const BOLTZMANN_CONSTANT: f64 = 1.380649e-23; // J/K
pub const REFERENCE_TEMP: f64 = 290.0; // K

// Linear quantities throughout; gains, noise figure and losses are not in dB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarConfig {
    #[serde(alias = "fcar")]
    pub carrier_freq: f64,
    pub tx_power: f64,
    pub tx_gain: f64,
    pub rx_gain: f64,
    // System noise temperature, K
    #[serde(default = "default_op_temp")]
    pub op_temp: f64,
    #[serde(alias = "sampRate")]
    pub sample_rate: f64,
    #[serde(alias = "noiseFig")]
    pub noise_figure: f64,
    pub total_losses: f64,
    #[serde(alias = "PRF")]
    pub prf: f64,
    // Optional CPI length, used to derive the pulse count when none is given.
    #[serde(default, alias = "dwell_time", skip_serializing_if = "Option::is_none")]
    pub dwell_time: Option<f64>,
}

fn default_op_temp() -> f64 {
    REFERENCE_TEMP
}

impl RadarConfig {
    pub fn wavelength(&self) -> f64 {
        wavelength(self.carrier_freq)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("carrier frequency", self.carrier_freq)?;
        ensure_positive("transmit power", self.tx_power)?;
        ensure_positive("transmit gain", self.tx_gain)?;
        ensure_positive("receive gain", self.rx_gain)?;
        ensure_positive("operating temperature", self.op_temp)?;
        ensure_positive("sample rate", self.sample_rate)?;
        ensure_positive("PRF", self.prf)?;
        if !(self.noise_figure >= 1.) {
            return Err(RdmError::NoiseFigureBelowUnity(self.noise_figure));
        }
        if !(self.total_losses >= 1.) {
            return Err(RdmError::LossesBelowUnity(self.total_losses));
        }
        if let Some(dwell) = self.dwell_time {
            ensure_positive("dwell time", dwell)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_radar() -> RadarConfig {
    RadarConfig {
        carrier_freq: 10e9,
        tx_power: 1e3,
        tx_gain: 10f64.powf(3.),
        rx_gain: 10f64.powf(3.),
        op_temp: 290.,
        sample_rate: 20e6,
        noise_figure: 10f64.powf(0.8),
        total_losses: 10f64.powf(0.8),
        prf: 200e3,
        dwell_time: None,
    }
}
