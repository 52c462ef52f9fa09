use std::f64::consts::PI;

use ndarray::Array1;
use num::complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    radar::SPEED_OF_LIGHT,
    signal::fft::{fft_frequencies, FFT},
};

// Slow-time phase modulation that spreads a return across Doppler bins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VbmMethod {
    // Linear frequency sweep across the CPI
    #[default]
    Chirp,
    // Random phase spectrum confined to the mask band, then limited to unit magnitude
    RandomBand,
}

/// Doppler half-width, in Hz, of a mask spanning `±range_rate_delta`.
pub fn frequency_delta(carrier_freq: f64, range_rate_delta: f64) -> f64 {
    carrier_freq / SPEED_OF_LIGHT * range_rate_delta.abs()
}

/// Unit-magnitude slow-time sequence, one sample per pulse.
pub fn slow_time_sequence<R: Rng + ?Sized>(
    method: VbmMethod,
    num_pulses: usize,
    carrier_freq: f64,
    range_rate_delta: f64,
    prf: f64,
    rng: &mut R,
) -> Array1<Complex64> {
    let f_delta = frequency_delta(carrier_freq, range_rate_delta);
    debug!(?method, f_delta, "velocity bin masking");

    match method {
        VbmMethod::Chirp => {
            let cpi = num_pulses as f64 / prf;
            (0..num_pulses)
                .map(|i| {
                    let t = i as f64 / prf;
                    let phase = 2. * PI * (-f_delta * t + f_delta * t * t / cpi);
                    Complex64::from_polar(1., phase)
                })
                .collect()
        }
        VbmMethod::RandomBand => {
            let phases = Uniform::new(0., 2. * PI);
            let mut spectrum: Array1<Complex64> = fft_frequencies(num_pulses, 1. / prf)
                .iter()
                .map(|f| {
                    if f.abs() <= f_delta {
                        Complex64::from_polar(1., phases.sample(rng))
                    } else {
                        Complex64::new(0., 0.)
                    }
                })
                .collect();
            // Always keep some energy so the phase is defined everywhere.
            if spectrum.iter().all(|x| x.norm() == 0.) {
                spectrum[0] = Complex64::new(1., 0.);
            }
            spectrum
                .ifft()
                .mapv(|x| if x.norm() > 0. { x / x.norm() } else { Complex64::new(1., 0.) })
        }
    }
}
