use rand::Rng;

/// Source of randomness for recommendation selection
///
/// Injected into the service so tests can force either branch of the
/// weighted split and pin the picked element.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// Uniform value in [0, 1)
    fn unit(&self) -> f64;

    /// Uniform index in [0, len); `len` is never 0
    fn index(&self, len: usize) -> usize;
}

/// Production source backed by the thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}
