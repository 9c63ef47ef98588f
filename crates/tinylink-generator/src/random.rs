use crate::Generator;
use parking_lot::Mutex;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tinylink_core::shortcode::GENERATED_LENGTH;
use tinylink_core::ShortCode;

/// Draws 8-character codes uniformly from `[A-Za-z0-9]`.
///
/// By default each call samples the thread-local RNG. A seeded generator
/// produces a reproducible sequence, which is handy for tests.
#[derive(Debug, Default)]
pub struct RandomGenerator {
    seeded: Option<Mutex<StdRng>>,
}

impl RandomGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..GENERATED_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let code = match &self.seeded {
            Some(rng) => sample(&mut *rng.lock()),
            None => sample(&mut rand::rng()),
        };
        ShortCode::new_unchecked(code)
    }
}
