use chrono::{DateTime, Utc};
use rand::RngExt;

use crate::domain::repository::{Clock, RandomSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Thread-local CSPRNG. Serves both the numeric draws and the QR bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn numeric(&self, low: u32, high: u32) -> u32 {
        rand::rng().random_range(low..=high)
    }

    fn secure_bytes(&self, len: usize) -> Vec<u8> {
        let mut rng = rand::rng();
        (0..len).map(|_| rng.random::<u8>()).collect()
    }
}
