use ndarray::Array2;
use num::complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{ensure_positive, RdmError, Result};

// Circular complex Gaussian noise. The variance is the total power of each
// complex sample, split evenly between the I and Q channels.
#[derive(Debug, Clone, Copy)]
pub struct ComplexGaussian {
    distr: Normal<f64>,
}

impl ComplexGaussian {
    pub fn new(variance: f64) -> Result<ComplexGaussian> {
        ensure_positive("noise variance", variance)?;
        let distr = Normal::new(0., (variance / 2.).sqrt()).map_err(|_| RdmError::InvalidParameter {
            name: "noise variance",
            value: variance,
        })?;
        Ok(ComplexGaussian { distr })
    }

    pub fn variance(&self) -> f64 {
        2. * self.distr.std_dev().powi(2)
    }

    pub fn sample_grid<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<Complex64> {
        Array2::from_shape_simple_fn(shape, || self.sample(rng))
    }
}

impl Distribution<Complex64> for ComplexGaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Complex64 {
        Complex64::new(self.distr.sample(rng), self.distr.sample(rng))
    }
}
