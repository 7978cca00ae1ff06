use rand::{thread_rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

/// User agents the scraper presents itself as
pub const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
];

/// Pick the identity at `index`, wrapping around the pool
///
/// Returns `None` only for an empty pool.
pub fn identity_at(pool: &[String], index: usize) -> Option<&str> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[index % pool.len()].as_str())
}

/// Immutable pool of client identities
///
/// Selection holds no state, so one pool is shared by every concurrent
/// request.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    user_agents: Vec<String>,
}

impl IdentityPool {
    /// Create a pool from the given user agents
    ///
    /// Strings that are not valid header values are dropped. If nothing is
    /// left the built-in identities are used.
    pub fn new(user_agents: Vec<String>) -> Self {
        let mut usable: Vec<String> = user_agents
            .into_iter()
            .filter(|ua| {
                let ok = HeaderValue::from_str(ua).is_ok();
                if !ok {
                    warn!("Ignoring user agent that is not a valid header value: {:?}", ua);
                }
                ok
            })
            .collect();

        if usable.is_empty() {
            usable = DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect();
        }

        Self { user_agents: usable }
    }

    pub fn identity_count(&self) -> usize {
        self.user_agents.len()
    }

    /// Select a random user agent
    pub fn random(&self) -> &str {
        let index = thread_rng().gen_range(0..self.user_agents.len());
        // `new` guarantees a non-empty pool
        identity_at(&self.user_agents, index).unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    /// Headers carrying a freshly chosen identity
    pub fn random_headers(&self) -> HeaderMap {
        let user_agent = self.random();
        debug!("Using user agent: {}", user_agent);

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
