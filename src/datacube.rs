use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use num::complex::Complex64;
use rand::Rng;
use rustfft::FftPlanner;

use crate::{
    error::{RdmError, Result},
    geometry::num_range_bins,
    helper::voltage_decibels,
    noise::ComplexGaussian,
    signal::fft::fft_frequencies_shifted,
    waveform::Waveform,
};

/// How a newly allocated cube is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Zeros,
    // Complex noise of the given per-sample variance
    Noise(f64),
}

// Rows are range bins at the receiver sample rate, columns are pulses.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCube {
    data: Array2<Complex64>,
}

/// Location and size of the largest magnitude sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub range_bin: usize,
    pub pulse: usize,
    pub magnitude: f64,
}

impl DataCube {
    pub fn zeros(num_range_bins: usize, num_pulses: usize) -> DataCube {
        DataCube {
            data: Array2::zeros((num_range_bins, num_pulses)),
        }
    }

    pub fn noise<R: Rng + ?Sized>(
        num_range_bins: usize,
        num_pulses: usize,
        variance: f64,
        rng: &mut R,
    ) -> Result<DataCube> {
        let noise = ComplexGaussian::new(variance)?;
        Ok(DataCube {
            data: noise.sample_grid((num_range_bins, num_pulses), rng),
        })
    }

    /// Allocates a cube holding one PRI of fast-time samples for each of `num_pulses` pulses.
    pub fn create<R: Rng + ?Sized>(
        sample_rate: f64,
        prf: f64,
        num_pulses: usize,
        fill: Fill,
        rng: &mut R,
    ) -> Result<DataCube> {
        let bins = num_range_bins(sample_rate, prf);
        match fill {
            Fill::Zeros => Ok(DataCube::zeros(bins, num_pulses)),
            Fill::Noise(variance) => DataCube::noise(bins, num_pulses, variance, rng),
        }
    }

    pub fn num_range_bins(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_pulses(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<Complex64> {
        &mut self.data
    }

    pub fn pulse(&self, pulse: usize) -> ArrayView1<Complex64> {
        self.data.column(pulse)
    }

    /// Adds `samples` into the column of `pulse`, starting at range bin `start`.
    /// Samples running past the last range bin are dropped.
    pub fn add_at_index(&mut self, pulse: usize, samples: &Array1<Complex64>, start: usize) {
        let bins = self.num_range_bins();
        if pulse >= self.num_pulses() || start >= bins {
            return;
        }
        let len = samples.len().min(bins - start);
        let mut column = self.data.column_mut(pulse);
        let mut target = column.slice_mut(s![start..start + len]);
        target += &samples.slice(s![..len]);
    }

    pub fn try_add(&self, other: &DataCube) -> Result<DataCube> {
        if self.shape() != other.shape() {
            return Err(RdmError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(DataCube {
            data: &self.data + &other.data,
        })
    }

    /// Correlates every pulse against the transmitted waveform.
    ///
    /// This is a convolution with the time-reversed conjugate of the pulse,
    /// centred so that output bin `j` is full convolution index `j + (L-1)/2`
    /// for a pulse of `L` samples. A pulse injected at its leading edge `k`
    /// therefore peaks near `k + L/2`, the pulse centre. The output is
    /// truncated to the original number of range bins.
    pub fn apply_matched_filter(&mut self, waveform: &Waveform) {
        let h = waveform.matched_filter_coefficients();
        let taps = h.len();
        if taps == 0 {
            return;
        }
        let offset = (taps - 1) / 2;
        let bins = self.num_range_bins();
        if bins == 0 {
            return;
        }

        for mut column in self.data.axis_iter_mut(Axis(1)) {
            let x = column.to_owned();
            for j in 0..bins {
                let m = j + offset;
                let lo = m.saturating_sub(taps - 1);
                let hi = m.min(bins - 1);
                let mut acc = Complex64::new(0., 0.);
                for k in lo..=hi {
                    acc += x[k] * h[m - k];
                }
                column[j] = acc;
            }
        }
    }

    /// Scales each pulse by the matching taper coefficient.
    pub fn apply_slow_time_taper(&mut self, taper: &Array1<f64>) -> Result<()> {
        if taper.len() != self.num_pulses() {
            return Err(RdmError::ShapeMismatch {
                expected: self.shape(),
                actual: (self.num_range_bins(), taper.len()),
            });
        }
        for mut row in self.data.axis_iter_mut(Axis(0)) {
            row.zip_mut_with(taper, |x, &w| *x *= w);
        }
        Ok(())
    }

    /// Transforms every range bin across pulses, leaving zero Doppler at pulse index `n/2`.
    ///
    /// Returns the frequency axis of the shifted spectrum. The axis is spaced
    /// by `sample_rate / n`, i.e. computed with the fast-time sample spacing;
    /// callers converting it to range-rate rescale by `prf / sample_rate`.
    pub fn doppler_process(&mut self, sample_rate: f64) -> Array1<f64> {
        let n = self.num_pulses();
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);

        for mut row in self.data.axis_iter_mut(Axis(0)) {
            let mut spectrum = row.to_vec();
            fft.process(&mut spectrum);
            spectrum.rotate_right(n / 2);
            row.assign(&ArrayView1::from(&spectrum[..]));
        }

        fft_frequencies_shifted(n, 1. / sample_rate)
    }

    pub fn magnitude(&self) -> Array2<f64> {
        self.data.mapv(|x| x.norm())
    }

    /// 20 log10 |x| of each sample.
    pub fn magnitude_db(&self) -> Array2<f64> {
        self.data.mapv(|x| voltage_decibels(x.norm()))
    }

    pub fn peak(&self) -> Option<Peak> {
        self.data
            .indexed_iter()
            .map(|((range_bin, pulse), x)| Peak {
                range_bin,
                pulse,
                magnitude: x.norm(),
            })
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }

    pub fn pulse_energy(&self, pulse: usize) -> f64 {
        self.data.column(pulse).iter().map(|x| x.norm_sqr()).sum()
    }

    /// Variance across pulses of each range bin.
    pub fn range_bin_variance(&self) -> Array1<f64> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| {
                let n = row.len() as f64;
                let mean = row.sum() / n;
                row.iter().map(|x| (x - mean).norm_sqr()).sum::<f64>() / n
            })
            .collect()
    }

    /// Variance over every sample of the cube.
    pub fn variance(&self) -> f64 {
        let n = self.data.len().max(1) as f64;
        let mean = self.data.sum() / n;
        self.data.iter().map(|x| (x - mean).norm_sqr()).sum::<f64>() / n
    }
}
