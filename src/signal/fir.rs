use std::f64::consts::PI;

use ndarray::Array1;
use num::complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::signal::fft::FFT;

/**
This version of the hamming window uses 25/46 rather than the rounded 0.54. See equation (134) in [1].

[1] Armin Doerry, "Catalog of Window Taper Functions for Sidelobe Control", 2017.
           https://www.researchgate.net/profile/Armin_Doerry/publication/316281181_Catalog_of_Window_Taper_Functions_for_Sidelobe_Control/links/58f92cb2a6fdccb121c9d54d/Catalog-of-Window-Taper-Functions-for-Sidelobe-Control.pdf
*/
pub fn hamming_window(size: usize) -> Array1<f64> {
    const a0: f64 = 25. / 46.;
    const a1: f64 = 1. - a0;
    Array1::linspace(-PI, PI, size).mapv(|x| a0 + a1 * x.cos())
}

/// Returns the fft of [dolph_chebychev].
/// This window is usually defined as the ifft of this function, so both are made available.
/// Note that this function is
/// 1) Unnormalized
/// 2) Probably not what you want anyways. The window is the real part of the ifft of this function, which messes with the frequencies a bit.
pub fn dolph_chebychev_fft(size: usize, α: f64) -> Array1<Complex64> {
    assert!(size > 1);

    const i: Complex64 = Complex64::new(0., 1.);

    let N = size as f64;

    let denom = 10.0f64.powf(α);
    let β = (denom.acosh() / (N - 1.)).cosh();

    fn T(n: usize, x: f64) -> f64 {
        let n1 = n as f64;
        if x >= -1. && x <= 1. {
            (n1 * x.acos()).cos()
        } else if x > 1. {
            (n1 * x.acosh()).cosh()
        } else {
            (-1f64).powi(n as i32) * (n1 * (-x).acosh()).cosh()
        }
    }

    if size % 2 == 1 {
        // Odd length, even order
        (0..size)
            .map(|k| {
                let x = k as f64;
                // Note that we omit the denom normalization factor in favor of normalizing after the fft.
                (T(size - 1, β * (PI * x / N).cos())).into()
            })
            .collect()
    } else {
        // Even length, odd order. In order to preserve the symmetry in the time domain we need to shift time by half a sample.
        // Doing this is equivalent to multiplying by an exponential factor in frequency.
        (0..size)
            .map(|k| {
                let x = k as f64;
                T(size - 1, β * (PI * x / N).cos()) * (x / N * PI * i).exp()
            })
            .collect()
    }
}

/**
Dolph-Chebychev is window which is optimal for a given sidelobe height.
The parameter α controls the height of the sidelobes. In decibels,
the sidelobes will have height -20α. For more information on this window see
https://ccrma.stanford.edu/~jos/sasp/Dolph_Chebyshev_Window.html
For implementation details, see
https://github.com/scipy/scipy/blob/v1.7.1/scipy/signal/windows/windows.py#L1350-L1473
*/
pub fn dolph_chebychev(size: usize, α: f64) -> Array1<f64> {
    if size == 1 {
        return Array1::ones(1);
    }
    let mut out = dolph_chebychev_fft(size, α).fft().mapv(|x| x.re);
    let peak = out.iter().copied().fold(f64::MIN, f64::max);
    out /= peak;
    if let Some(slice) = out.as_slice_mut() {
        slice.rotate_right((size - 1) / 2);
    }
    out
}

/**
The taylor window requires a set of coefficients which depend solely on the sidelobe levels and number of untapered sidelobes.
This function generates those coeffient so that they can be used in multiple windows of differing length. For more information, see [taylor]
*/
pub fn taylor_coefficients(η: f64, num_const_sidelobes: usize) -> Array1<f64> {
    let n_bar = num_const_sidelobes as f64;
    let A = η.acosh() / PI;
    let σ_sq = n_bar.powi(2) / (A * A + (n_bar - 0.5).powi(2));
    (1..num_const_sidelobes)
        .map(|i| -> f64 {
            let m = i as f64;
            let denom: f64 = (1..num_const_sidelobes)
                .filter(|j| *j != i)
                .map(|j| {
                    let n = j as f64;
                    1. - (m * m / (n * n))
                })
                .product();

            let num: f64 = (1..num_const_sidelobes)
                .map(|j| {
                    let n = j as f64;
                    1. - (m * m) / (σ_sq) / (A * A + (n - 0.5).powi(2))
                })
                .product();

            // (-1)^(i+1)
            let s = (2 * (i % 2)) as f64 - 1.;

            0.5 * s * num / denom
        })
        .collect()
}

/**
This function takes the output from [taylor_coefficients] and produces a window of the given size. See [taylor] for more information.
*/
pub fn taylor_from_coefficients(size: usize, coefficients: Array1<f64>) -> Array1<f64> {
    let num_const_sidelobes = coefficients.len() + 1;
    let M = size as f64;
    let Fm = coefficients;
    let W = |n: f64| -> f64 {
        1. + 2.
            * (1..num_const_sidelobes)
                .map(|i| {
                    let m = i as f64;
                    Fm[i - 1] * (2. * PI * m * (n - M / 2. + 0.5) / M).cos()
                })
                .sum::<f64>()
    };
    (0..size).map(|x| W(x as f64)).collect::<Array1<f64>>() / W((M - 1.) / 2.)
}

/**
Generates a Taylor window. This window is a variant of the dolph-chebychev window which provides a configurable taper on the sidelobes.
Unlike most implementations, this takes the sidelobe level η in linear space. To convert a decibel sidelobe level to linear use η=10^(x/20).
The third parameter, num_const_sidelobes, describes the number of sidelobes that should not be tapered.

[1] Armin Doerry, "Catalog of Window Taper Functions for Sidelobe Control", 2017.
[2] https://github.com/scipy/scipy/blob/97ea4e506c7a4c6fdd144c09e00522134dd64c94/scipy/signal/windows/windows.py#L1623
*/
pub fn taylor(size: usize, η: f64, num_const_sidelobes: usize) -> Array1<f64> {
    taylor_from_coefficients(size, taylor_coefficients(η, num_const_sidelobes))
}

/**
This window is a tapered cosine window. It takes a fraction α between 0 and 1 and returns a window such that (1-α) is a rectangle window and the remainder is a cosine window. If α >= 1 this is equivalent to a hann window, if α <= 0 then this is equivalent to a rectangular window.
*/
pub fn tukey(size: usize, α: f64) -> Array1<f64> {
    let N = (size as f64) - 1.;

    let mut arr = Array1::zeros(size);
    for i in 0..size {
        let n = i as f64;
        if n >= 0. && n < α * N / 2. {
            arr[i] = 0.5 * (1. - (2. * PI * n / (α * N)).cos());
        } else if n >= α * N / 2. && n <= N / 2. {
            arr[i] = 1.;
        } else {
            arr[i] = arr[(size - 1) - i];
        }
    }

    arr
}

/// Slow-time amplitude taper applied before Doppler processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Taper {
    Chebyshev {
        #[serde(alias = "sidelobeDb")]
        sidelobe_db: f64,
    },
    Taylor {
        #[serde(alias = "sidelobeDb")]
        sidelobe_db: f64,
        nbar: usize,
    },
    Hamming,
    Tukey {
        alpha: f64,
    },
    Rectangular,
}

impl Default for Taper {
    fn default() -> Self {
        Taper::Chebyshev { sidelobe_db: 60. }
    }
}

impl Taper {
    pub fn window(&self, size: usize) -> Array1<f64> {
        match *self {
            Taper::Chebyshev { sidelobe_db } => dolph_chebychev(size, sidelobe_db.abs() / 20.),
            Taper::Taylor { sidelobe_db, nbar } => {
                taylor(size, 10f64.powf(sidelobe_db.abs() / 20.), nbar)
            }
            Taper::Hamming => hamming_window(size),
            Taper::Tukey { alpha } => tukey(size, alpha),
            Taper::Rectangular => Array1::ones(size),
        }
    }

    /// The window scaled to unit mean, so tapering leaves the average pulse amplitude unchanged.
    pub fn coefficients(&self, size: usize) -> Array1<f64> {
        let window = self.window(size);
        match window.mean() {
            Some(mean) if mean > 0. => window / mean,
            _ => window,
        }
    }
}
