use std::sync::Arc;

use ndarray::Array1;
use num::complex::Complex64;
use rustfft::{Fft, FftPlanner};

pub trait FFT {
    fn fft_planned(self, plan: &Arc<dyn Fft<f64>>) -> Array1<Complex64>;
    fn fft(self) -> Array1<Complex64>;
    fn fft_plottable(self) -> Array1<Complex64>;

    fn ifft(self) -> Array1<Complex64>;
}

impl FFT for Array1<f64> {
    fn fft(self) -> Array1<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).fft()
    }

    fn fft_plottable(self) -> Array1<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).fft_plottable()
    }

    fn ifft(self) -> Array1<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).ifft()
    }

    fn fft_planned(self, plan: &Arc<dyn Fft<f64>>) -> Array1<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).fft_planned(plan)
    }
}

impl FFT for Array1<Complex64> {
    fn fft_planned(mut self, plan: &Arc<dyn Fft<f64>>) -> Array1<Complex64> {
        match self.as_slice_mut() {
            Some(data) => plan.process(data),
            None => {
                let mut data = self.to_vec();
                plan.process(&mut data);
                self = Array1::from(data);
            }
        }

        self
    }

    fn fft(self) -> Array1<Complex64> {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.len());

        self.fft_planned(&fft)
    }

    fn fft_plottable(self) -> Array1<Complex64> {
        let mut out = self.fft();
        fft_shift(&mut out);
        out
    }

    fn ifft(self) -> Array1<Complex64> {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_inverse(self.len());

        let N = self.len() as f64;

        self.fft_planned(&fft) / N
    }
}

// The FFT output is in "wrapped" order, with the negative frequencies after the positive ones.
// Rotating by n/2 moves the zero frequency bin to index n/2, the same as numpy's fftshift.
pub fn fft_shift<T: Clone>(data: &mut Array1<T>) {
    let n = data.len();
    match data.as_slice_mut() {
        Some(slice) => slice.rotate_right(n / 2),
        None => {
            let mut values = data.to_vec();
            values.rotate_right(n / 2);
            *data = Array1::from(values);
        }
    }
}

/// Sample frequencies of an FFT of length `n` with sample spacing `d`, in unshifted order.
pub fn fft_frequencies(n: usize, d: f64) -> Array1<f64> {
    let scale = 1. / (n as f64 * d);
    let split = (n + 1) / 2;
    (0..n)
        .map(|k| {
            if k < split {
                k as f64 * scale
            } else {
                (k as f64 - n as f64) * scale
            }
        })
        .collect()
}

/// Sample frequencies in increasing order, matching [fft_shift]ed data.
pub fn fft_frequencies_shifted(n: usize, d: f64) -> Array1<f64> {
    let mut freqs = fft_frequencies(n, d);
    fft_shift(&mut freqs);
    freqs
}
