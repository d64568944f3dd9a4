// kestrel_sim/src/noise.rs

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Anything that can corrupt a vector with noise.
pub trait NoiseSource: Send {
    /// Returns `v` with one fresh noise sample added.
    fn add_noise(&mut self, v: &DVector<f64>) -> DVector<f64>;
}

/// Zero-mean Gaussian white noise, `n = S * w` with `w ~ N(0, I)` and `S`
/// the standard-deviation matrix.
///
/// Seeded from a `ChaCha8Rng`, so a given seed always gives the same sequence.
pub struct GaussianWhiteNoise {
    std_dev: DMatrix<f64>,
    rng: ChaCha8Rng,
}

impl GaussianWhiteNoise {
    /// Unit noise of dimension `dim`.
    pub fn new(dim: usize, seed: u64) -> Self {
        Self {
            std_dev: DMatrix::identity(dim, dim),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Noise with the same standard deviation on every axis.
    pub fn isotropic(dim: usize, std_dev: f64, seed: u64) -> Self {
        let mut noise = Self::new(dim, seed);
        noise.std_dev *= std_dev;
        noise
    }

    pub fn dim(&self) -> usize {
        self.std_dev.nrows()
    }

    /// Sets the standard-deviation matrix `S`. The covariance of the noise is
    /// `S * S^T`.
    pub fn set_standard_deviation(&mut self, std_dev: DMatrix<f64>) {
        self.std_dev = std_dev;
    }

    pub fn covariance(&self) -> DMatrix<f64> {
        &self.std_dev * self.std_dev.transpose()
    }

    /// Draws one noise vector.
    pub fn sample(&mut self) -> DVector<f64> {
        let w = DVector::from_fn(self.std_dev.ncols(), |_, _| -> f64 {
            StandardNormal.sample(&mut self.rng)
        });
        &self.std_dev * w
    }
}

impl NoiseSource for GaussianWhiteNoise {
    fn add_noise(&mut self, v: &DVector<f64>) -> DVector<f64> {
        v + self.sample()
    }
}
