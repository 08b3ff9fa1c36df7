//! Sliding-window random linear combinations

use crate::coding::packet::CodedPacket;
use crate::coding::traits::{CodingError, CombinationGenerator};
use crate::utils::CodingRng;
use log::debug;

/// Configuration for sliding-window generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowConfig {
    /// Number of coded packets to produce
    pub count: usize,
    /// Maximum number of consecutive source packets mixed into one coded packet
    pub window: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            count: 1,
            window: 4,
        }
    }
}

impl WindowConfig {
    /// Create a configuration producing `count` packets over windows of `window` sources
    pub fn new(count: usize, window: usize) -> Self {
        Self { count, window }
    }

    /// Set the number of coded packets
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the window size
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// Generator mixing randomly placed windows of consecutive source packets
#[derive(Debug, Clone)]
pub struct SlidingWindowGenerator {
    config: WindowConfig,
    rng: CodingRng,
}

impl SlidingWindowGenerator {
    /// Create a deterministic generator
    pub fn new(config: WindowConfig, seed: u64) -> Self {
        Self::with_rng(config, CodingRng::seed_from_u64(seed))
    }

    /// Create a generator drawing from an existing RNG
    pub fn with_rng(config: WindowConfig, rng: CodingRng) -> Self {
        Self { config, rng }
    }

    /// Get the current configuration
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// One coded packet over a random window of `sources`
    fn combine_window(&mut self, sources: &[CodedPacket]) -> Result<CodedPacket, CodingError> {
        let l = sources[0].l();
        let width = self.config.window.min(sources.len());
        let start = self.rng.generate_index(sources.len() - width + 1);
        let window = &sources[start..start + width];

        let payload_len = window.iter().map(|p| p.data().len()).max().unwrap_or(0);
        let mut coded = CodedPacket::new(l, payload_len)?;
        for source in window {
            let c = self.rng.generate_nonzero_coefficient(l);
            coded.add_scaled_assign(source, c)?;
        }
        Ok(coded)
    }
}

impl CombinationGenerator for SlidingWindowGenerator {
    fn generate(&mut self, sources: &[CodedPacket]) -> Result<Vec<CodedPacket>, CodingError> {
        if sources.is_empty() || self.config.window == 0 {
            return Err(CodingError::InvalidParameters);
        }
        let l = sources[0].l();
        if let Some(other) = sources.iter().find(|p| p.l() != l) {
            return Err(CodingError::FieldMismatch {
                left: l,
                right: other.l(),
            });
        }

        debug!(
            "generating {} sliding-window combinations (window {}) over {} sources",
            self.config.count,
            self.config.window,
            sources.len()
        );
        (0..self.config.count)
            .map(|_| self.combine_window(sources))
            .collect()
    }
}
