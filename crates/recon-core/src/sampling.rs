//! Uniform draws for Bernoulli sampling.
//!
//! The transition engine asks a [`SampleSource`] for one uniform number in
//! `[0, 1)` per stochastic ground instance and compares it against the
//! resolved probability: the next value is `true` iff `u < p`.
//!
//! [`SeededStreams`] derives every draw from `(seed, episode, step, ground
//! variable)`, so a given seed and action sequence always reproduces the
//! same trajectory regardless of the order ground instances are visited in,
//! while each episode after a reset sees fresh draws.
//! [`RngSource`] draws sequentially from any [`rand::Rng`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use recon_types::GroundVariable;

/// Supplier of uniform `[0, 1)` draws for stochastic transitions.
pub trait SampleSource {
    /// Draw a uniform number in `[0, 1)` for `ground` at `step`.
    fn uniform(&mut self, step: u64, ground: &GroundVariable) -> f64;

    /// Called when the simulator restarts an episode.
    fn reset(&mut self) {}
}

/// Deterministic per-instance random streams keyed by a world seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededStreams {
    /// The world seed.
    seed: u64,
    /// Resets seen so far. Never cleared.
    episode: u64,
}

impl SeededStreams {
    /// Create streams for a seed, starting at episode 0.
    pub const fn new(seed: u64) -> Self {
        Self { seed, episode: 0 }
    }

    /// The world seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The current episode counter.
    pub const fn episode(&self) -> u64 {
        self.episode
    }
}

impl SampleSource for SeededStreams {
    fn uniform(&mut self, step: u64, ground: &GroundVariable) -> f64 {
        let episode_seed = stream_key(self.seed, self.episode, EPISODE_LANE);
        let key = stream_key(episode_seed, step, ground_hash(ground));
        SmallRng::seed_from_u64(key).random::<f64>()
    }

    fn reset(&mut self) {
        self.episode = self.episode.wrapping_add(1);
    }
}

/// Instance slot used when deriving the per-episode sub-seed.
const EPISODE_LANE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Sequential draws from an arbitrary RNG, ignoring step and instance.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    /// The wrapped generator.
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wrap a generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<SmallRng> {
    /// A small fast generator seeded from a `u64`.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SampleSource for RngSource<R> {
    fn uniform(&mut self, _step: u64, _ground: &GroundVariable) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Mix seed, step, and instance hash into one stream key.
const fn stream_key(seed: u64, step: u64, instance: u64) -> u64 {
    let mut state = seed.wrapping_add(step.wrapping_mul(0x517c_c1b7_2722_0a95)) ^ instance;

    // xorshift requires non-zero input.
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

/// FNV-1a over the variable name and every argument's type and name.
fn ground_hash(ground: &GroundVariable) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let mut feed = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(PRIME);
        }
        // Separator so ("ab","c") and ("a","bc") differ.
        hash ^= 0xff;
        hash = hash.wrapping_mul(PRIME);
    };

    feed(ground.name.as_str().as_bytes());
    for arg in &ground.args {
        feed(arg.type_name.as_str().as_bytes());
        feed(arg.name.as_str().as_bytes());
    }
    hash
}
