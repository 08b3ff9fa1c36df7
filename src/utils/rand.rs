use crate::field::field_size;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random number generator wrapper for network coding
#[derive(Debug, Clone)]
pub struct CodingRng {
    rng: ChaCha8Rng,
}

impl CodingRng {
    /// Create a new RNG with a random seed
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Create a new RNG with a specific seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Create a new RNG from a 64-bit seed
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform element of GF(2^(2^l)), zero included
    pub fn generate_coefficient(&mut self, l: u8) -> u8 {
        self.rng.gen_range(0..field_size(l)) as u8
    }

    /// Uniform nonzero element of GF(2^(2^l))
    pub fn generate_nonzero_coefficient(&mut self, l: u8) -> u8 {
        self.rng.gen_range(1..field_size(l)) as u8
    }

    /// Generate `count` uniform coefficients of GF(2^(2^l))
    pub fn generate_coefficients(&mut self, l: u8, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.generate_coefficient(l)).collect()
    }

    /// Uniform index in `0..bound`; `bound` must be nonzero
    pub fn generate_index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    /// Fill a buffer with random bytes
    pub fn fill_bytes(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.rng);
    }
}

impl Default for CodingRng {
    fn default() -> Self {
        Self::new()
    }
}
