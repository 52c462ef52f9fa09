use std::f64::consts::PI;

use ndarray::Array1;
use num::complex::Complex64;

pub mod fft;
pub mod fir;

pub fn sampling_freq_to_len(interval: f64, sampling_frequency: f64) -> usize {
    (interval * sampling_frequency).round() as usize
}

fn rectangle(t: f64, width: f64) -> f64 {
    if t >= -width / 2. && t <= width / 2. {
        1.
    } else {
        0.
    }
}

pub trait Signal {
    fn generate(&self, t: f64) -> Complex64;

    fn generate_signal(&self, time: &SampledDomain) -> Array1<Complex64> {
        time.iter().map(|t| self.generate(t)).collect()
    }
}

// A run of sample times starting at `start`, spaced by the inverse of the sample rate.
#[derive(Clone, Debug)]
pub struct SampledDomain {
    start: f64,
    freq: f64,
    samples: usize,
}

impl SampledDomain {
    pub fn new(start: f64, end: f64, freq: f64) -> SampledDomain {
        assert!(start <= end);
        SampledDomain {
            start,
            freq,
            samples: sampling_freq_to_len(end - start, freq),
        }
    }

    pub fn from_sample_count(start: f64, freq: f64, samples: usize) -> SampledDomain {
        SampledDomain {
            start,
            freq,
            samples,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn sample_interval(&self) -> f64 {
        1. / self.freq
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let (start, dt) = (self.start, self.sample_interval());
        (0..self.sample_count()).map(move |k| start + k as f64 * dt)
    }
}

// Unit amplitude baseband rectangle starting at t=0.
#[derive(Clone, Debug)]
pub struct Rectangle {
    pub length: f64,
}

impl Signal for Rectangle {
    fn generate(&self, t: f64) -> Complex64 {
        rectangle(t - self.length / 2., self.length).into()
    }
}

// Baseband linear FM chirp starting at t=0. An up chirp (positive direction)
// sweeps from -bandwidth/2 to +bandwidth/2 over the pulse, a down chirp the reverse.
#[derive(Clone, Debug)]
pub struct Chirp {
    pub bandwidth: f64,
    pub length: f64,
    pub direction: f64,
}

impl Chirp {
    pub fn slope(&self) -> f64 {
        self.direction.signum() * self.bandwidth / self.length
    }
}

impl Signal for Chirp {
    fn generate(&self, t: f64) -> Complex64 {
        const i: Complex64 = Complex64::new(0., 1.);

        let centered = t - self.length / 2.;
        rectangle(centered, self.length) * (i * PI * self.slope() * centered * centered).exp()
    }
}
