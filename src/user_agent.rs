//! Browser user-agent pool used to make requests look like a real visitor.

use rand::seq::SliceRandom;
use rand::Rng;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// How the user agent changes after the site answers 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAgentRotation {
    /// Pick a different random agent from the pool.
    Random,
    /// Always send the first agent in the pool.
    Fixed,
}

pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Picks an agent other than `current`, falling back to `current` when the pool
/// has nothing else to offer.
pub fn rotate_user_agent<R: Rng + ?Sized>(rng: &mut R, current: &str) -> &'static str {
    let others: Vec<&'static str> = USER_AGENTS
        .iter()
        .copied()
        .filter(|agent| *agent != current)
        .collect();

    others
        .choose(rng)
        .copied()
        .unwrap_or_else(|| random_user_agent(rng))
}

impl UserAgentRotation {
    pub fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        match self {
            UserAgentRotation::Random => random_user_agent(rng),
            UserAgentRotation::Fixed => USER_AGENTS[0],
        }
    }

    pub fn next<R: Rng + ?Sized>(&self, rng: &mut R, current: &'static str) -> &'static str {
        match self {
            UserAgentRotation::Random => rotate_user_agent(rng, current),
            UserAgentRotation::Fixed => current,
        }
    }
}
