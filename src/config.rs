//! Construction parameters shared by the randomized queues
//!
//! Skip-list heights and the default dirty comparator both draw from a
//! random source owned by the queue. `QueueConfig` fixes the seed so that a
//! run with a deterministic prediction feed is reproducible, including its
//! comparison counts.
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::config::QueueConfig;
//!
//! let config = QueueConfig::default().with_seed(7).with_damage_ratio(0.1);
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.promotion_probability, 0.5);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Default probability that a skip-list node grows one more level
pub const DEFAULT_PROMOTION_PROBABILITY: f64 = 0.5;

/// Default probability that the damaged comparator flips its answer
pub const DEFAULT_DAMAGE_RATIO: f64 = 0.25;

/// Upper bound on sampled skip-list heights
pub const DEFAULT_MAX_HEIGHT: usize = 32;

/// Parameters for skip-list based queues
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueConfig {
    /// Seed for every random source owned by the queue
    pub seed: u64,
    /// Success probability of the geometric height distribution
    pub promotion_probability: f64,
    /// Cap on node heights
    pub max_height: usize,
    /// Flip probability of [`DamagedComparator`](crate::skiplist::DamagedComparator)
    pub damage_ratio: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            promotion_probability: DEFAULT_PROMOTION_PROBABILITY,
            max_height: DEFAULT_MAX_HEIGHT,
            damage_ratio: DEFAULT_DAMAGE_RATIO,
        }
    }
}

impl QueueConfig {
    /// Sets the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the promotion probability, clamped to `[0, 1)`
    pub fn with_promotion_probability(mut self, p: f64) -> Self {
        self.promotion_probability = p.clamp(0.0, 0.999);
        self
    }

    /// Sets the maximum node height (at least 1)
    pub fn with_max_height(mut self, height: usize) -> Self {
        self.max_height = height.max(1);
        self
    }

    /// Sets the damaged comparator's flip probability, clamped to `[0, 1]`
    pub fn with_damage_ratio(mut self, ratio: f64) -> Self {
        self.damage_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Random source for skip-list heights
    pub(crate) fn height_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Random source for comparator damage, independent of the height stream
    pub(crate) fn damage_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ 0x9e37_79b9_7f4a_7c15)
    }
}
