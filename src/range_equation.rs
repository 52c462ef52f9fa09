use std::f64::consts::PI;

use tracing::info;

use crate::{
    helper::decibels,
    radar::{RadarConfig, BOLTZMANN_CONSTANT},
};

// Linear units throughout: power ratios, W, m, K.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEquation {
    pub tx_power: f64,
    pub tx_gain: f64,
    pub rx_gain: f64,
    pub rcs: f64,
    pub wavelength: f64,
    pub bandwidth: f64,
    pub noise_figure: f64,
    pub losses: f64,
    pub temperature: f64,
}

impl RangeEquation {
    pub fn new(radar: &RadarConfig, rcs: f64, bandwidth: f64) -> RangeEquation {
        RangeEquation {
            tx_power: radar.tx_power,
            tx_gain: radar.tx_gain,
            rx_gain: radar.rx_gain,
            rcs,
            wavelength: radar.wavelength(),
            bandwidth,
            noise_figure: radar.noise_figure,
            losses: radar.total_losses,
            temperature: radar.op_temp,
        }
    }

    fn signal_term(&self) -> f64 {
        self.tx_power * self.tx_gain * self.rx_gain * self.rcs * self.wavelength.powi(2)
    }

    fn noise_term(&self, bandwidth: f64) -> f64 {
        (4. * PI).powi(3)
            * BOLTZMANN_CONSTANT
            * self.temperature
            * bandwidth
            * self.noise_figure
            * self.losses
    }

    /// Single-pulse SNR for an uncoded pulse.
    pub fn snr_uncoded(&self, range: f64) -> f64 {
        self.signal_term() / (range.powi(4) * self.noise_term(self.bandwidth))
    }

    /// Single-pulse SNR after pulse compression.
    pub fn snr(&self, range: f64, time_bandwidth_product: f64) -> f64 {
        self.snr_uncoded(range) * time_bandwidth_product
    }

    /// SNR after coherently processing `num_pulses` pulses.
    pub fn snr_coherent(&self, range: f64, num_pulses: usize, time_bandwidth_product: f64) -> f64 {
        self.snr(range, time_bandwidth_product) * num_pulses as f64
    }

    // n_p pulses of n_c chips each.
    pub fn snr_bpsk_pulses(&self, range: f64, num_pulses: usize, num_chips: usize) -> f64 {
        self.snr_coherent(range, num_pulses, num_chips as f64)
    }

    /// Coherent SNR in duty factor form, for a CPI of `cpi_time` seconds at duty factor `duty` in [0, 1].
    pub fn snr_duty_factor(&self, range: f64, cpi_time: f64, duty: f64) -> f64 {
        self.signal_term() / (range.powi(4) * self.noise_term(1.)) * cpi_time * duty
    }

    /// Largest range at which a single pulse reaches `snr_threshold`.
    pub fn min_detection_range(&self, snr_threshold: f64) -> f64 {
        (self.signal_term() / (snr_threshold * self.noise_term(self.bandwidth))).powf(0.25)
    }

    pub fn min_detection_range_bpsk(
        &self,
        snr_threshold: f64,
        num_pulses: usize,
        num_chips: usize,
    ) -> f64 {
        self.min_detection_range(snr_threshold) * ((num_pulses * num_chips) as f64).powf(0.25)
    }

    pub fn min_detection_range_duty_factor(
        &self,
        snr_threshold: f64,
        cpi_time: f64,
        duty: f64,
    ) -> f64 {
        (self.signal_term() / (snr_threshold * self.noise_term(1.))).powf(0.25)
            * (cpi_time * duty).powf(0.25)
    }
}

/// Ties the synthetic voltage-domain signal to the range equation.
///
/// Every injected pulse is scaled by `snr_volt`, so that after coherent
/// summation over the CPI the expected peak SNR is `snr_expected`.
/// SNR is evaluated at the initial range and held for the whole CPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnrCalibration {
    pub snr_single_pulse: f64,
    pub snr_volt: f64,
    pub snr_expected: f64,
}

impl SnrCalibration {
    pub fn new(
        equation: &RangeEquation,
        range: f64,
        num_pulses: usize,
        time_bandwidth_product: f64,
    ) -> SnrCalibration {
        let snr_single_pulse = equation.snr(range, time_bandwidth_product);
        let calibration = SnrCalibration {
            snr_single_pulse,
            snr_volt: (snr_single_pulse / num_pulses as f64).sqrt(),
            snr_expected: equation.snr_coherent(range, num_pulses, time_bandwidth_product),
        };

        info!(
            snr_single_pulse_db = decibels(calibration.snr_single_pulse),
            snr_volt = calibration.snr_volt,
            snr_expected_db = decibels(calibration.snr_expected),
            "SNR check"
        );

        calibration
    }
}
