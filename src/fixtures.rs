//! Random test fixtures
//!
//! Every generator owns its RNG. Seed it explicitly to make a test
//! reproducible; no process-wide random state is involved.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::account::{CreateAccountParams, Currency};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Seeded generator for owners, amounts and currencies
pub struct Fixtures {
    rng: StdRng,
}

impl Fixtures {
    /// Deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform integer in `min..=max`
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }

    /// Lowercase ASCII string of length `n`
    pub fn random_string(&mut self, n: usize) -> String {
        (0..n)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    pub fn random_owner(&mut self) -> String {
        self.random_string(6)
    }

    /// Amount in minor units, 0..=1000
    pub fn random_money(&mut self) -> i64 {
        self.random_int(0, 1000)
    }

    pub fn random_currency(&mut self) -> Currency {
        Currency::ALL[self.rng.gen_range(0..Currency::ALL.len())]
    }

    /// Account with random owner, balance and currency
    pub fn account_params(&mut self) -> CreateAccountParams {
        CreateAccountParams {
            owner: self.random_owner(),
            balance: self.random_money(),
            currency: self.random_currency(),
        }
    }
}
