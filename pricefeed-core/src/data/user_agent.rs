//! User-agent pool and the randomness used to pick from it.
//!
//! Selection goes through [`UserAgentSource`] so tests can pin the choice with a
//! seeded source instead of process-wide randomness.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Built-in browser user agents, used when the configuration does not supply a pool.
pub fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Source of indices into the user-agent pool.
pub trait UserAgentSource: Send + Sync {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Process randomness (thread-local RNG).
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl UserAgentSource for ThreadRngSource {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic source: the same seed yields the same sequence of picks.
#[derive(Debug)]
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl UserAgentSource for SeededSource {
    fn pick(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            // Poisoned by a panicking picker: use the first agent.
            Err(_) => 0,
        }
    }
}

/// Pick one agent from `pool`, or `None` when the pool is empty.
pub fn choose<'a>(source: &dyn UserAgentSource, pool: &'a [String]) -> Option<&'a str> {
    if pool.is_empty() {
        return None;
    }
    let idx = source.pick(pool.len()).min(pool.len() - 1);
    Some(pool[idx].as_str())
}
