use ndarray::{ArrayD, IxDyn};
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform as UniformDistribution};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};

/// Repeatable uniform random initializer for test tensors
///
/// Two initializers built with the same bounds and seed produce the same values.
pub struct Uniform<T: SampleUniform> {
    rng: StdRng,
    distribution: UniformDistribution<T>,
}

impl<T> Uniform<T>
where
    T: SampleUniform + PartialOrd + Copy,
{
    /// Values in `[min, max)`; `min` must be below `max`
    pub fn new(min: T, max: T, seed: u64) -> Result<Self> {
        if !(min < max) {
            return Err(Error::InvalidArgument(
                "Uniform initializer needs min < max".to_string(),
            ));
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            distribution: UniformDistribution::new(min, max),
        })
    }

    pub fn sample(&mut self) -> T {
        self.distribution.sample(&mut self.rng)
    }

    /// Overwrite every element of `array` with a fresh sample
    pub fn initialize<'a>(&mut self, array: &'a mut ArrayD<T>) -> &'a mut ArrayD<T> {
        for element in array.iter_mut() {
            *element = self.distribution.sample(&mut self.rng);
        }
        array
    }

    /// Fresh array of the given shape
    pub fn array(&mut self, shape: &[usize]) -> ArrayD<T> {
        ArrayD::from_shape_simple_fn(IxDyn(shape), || self.sample())
    }
}
