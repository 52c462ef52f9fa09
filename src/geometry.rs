use ndarray::Array1;

use crate::radar::SPEED_OF_LIGHT;

const c: f64 = SPEED_OF_LIGHT;

/// Largest range that returns within one pulse repetition interval.
pub fn range_unambiguous(prf: f64) -> f64 {
    c / (2. * prf)
}

// Range bins are fast-time samples, one PRI of them per pulse.
pub fn range_bin_spacing(sample_rate: f64) -> f64 {
    c / (2. * sample_rate)
}

/// Number of fast-time samples in one PRI.
pub fn num_range_bins(sample_rate: f64, prf: f64) -> usize {
    (sample_rate / prf).round().max(1.) as usize
}

pub fn range_axis(sample_rate: f64, num_bins: usize) -> Array1<f64> {
    let dr = range_bin_spacing(sample_rate);
    (0..num_bins).map(|i| i as f64 * dr).collect()
}

// Round trip delay of each range bin.
pub fn time_axis(sample_rate: f64, num_bins: usize) -> Array1<f64> {
    range_axis(sample_rate, num_bins).mapv(|r| 2. * r / c)
}

/// Number of whole PRIs of propagation delay before the first echo arrives.
pub fn first_echo_bin(range: f64, prf: f64) -> usize {
    (range / range_unambiguous(prf)).floor().max(0.) as usize
}

pub fn alias_range(range: f64, prf: f64) -> f64 {
    range.rem_euclid(range_unambiguous(prf))
}

pub fn alias_time(time: f64, prf: f64) -> f64 {
    time.rem_euclid(1. / prf)
}

/// Two-way Doppler shift of a target at the given range-rate.
pub fn frequency_doppler(carrier_freq: f64, range_rate: f64) -> f64 {
    -2. * carrier_freq * range_rate / c
}

pub fn range_rate_from_doppler(carrier_freq: f64, freq: f64) -> f64 {
    -c * freq / (2. * carrier_freq)
}

pub fn num_pulses_for_dwell(dwell_time: f64, prf: f64) -> usize {
    (dwell_time * prf).ceil() as usize
}
