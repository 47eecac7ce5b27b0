//! Bounded per-host caches of robots.txt rules
//!
//! Each host's rules live in an [`ExpiringEntry`] keyed by the canonical
//! robots.txt URL. The map itself is a least-recently-used cache behind a
//! short-held lock; fetching happens in the entry, outside that lock.

use crate::cache::entry::{BoxFuture, Computed, ExpiringEntry};
use crate::cache::policy::{policy_for, CachePolicy};
use crate::cache::ttl::{HeaderWithDefaultPolicy, TtlPolicy};
use crate::config::{CacheConfig, OnError};
use crate::fetcher::Fetcher;
use crate::robots::{fetch_rules, Agent, RuleSet};
use crate::url::robots_url;
use crate::{RobotsError, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

type Loader<T> = Arc<dyn Fn(String) -> BoxFuture<Computed<T, RobotsError>> + Send + Sync>;

/// LRU map from robots.txt URL to its expiring entry
struct Entries<T> {
    map: Mutex<LruCache<String, Arc<ExpiringEntry<T, RobotsError>>>>,
    loader: Loader<T>,
}

impl<T: Clone + Send + Sync + 'static> Entries<T> {
    fn new(capacity: usize, loader: Loader<T>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            map: Mutex::new(LruCache::new(capacity)),
            loader,
        }
    }

    async fn get(&self, url: &str) -> Result<T> {
        let entry = self.entry(&robots_url(url)?);
        entry.get().await
    }

    async fn refresh(&self, url: &str) -> Result<T> {
        let entry = self.entry(&robots_url(url)?);
        entry.refresh().await
    }

    /// Finds or creates the entry for a robots.txt URL, marking it recently used
    fn entry(&self, key: &str) -> Arc<ExpiringEntry<T, RobotsError>> {
        let mut map = self.map.lock();
        if let Some(entry) = map.get(key) {
            return entry.clone();
        }

        let loader = self.loader.clone();
        let owned = key.to_string();
        let entry = Arc::new(ExpiringEntry::new(move || loader(owned.clone())));

        if let Some((evicted, _)) = map.push(key.to_string(), entry.clone()) {
            tracing::debug!("Evicted {} from robots cache", evicted);
        }
        entry
    }

    fn contains(&self, url: &str) -> bool {
        robots_url(url).map_or(false, |key| self.map.lock().contains(&key))
    }

    fn clear(&self) {
        self.map.lock().clear();
    }

    fn len(&self) -> usize {
        self.map.lock().len()
    }

    fn capacity(&self) -> usize {
        self.map.lock().cap().get()
    }
}

/// Configures and builds a [`RobotsCache`] or an [`AgentCache`]
///
/// # Examples
///
/// ```no_run
/// use robotgate::cache::CacheBuilder;
/// use robotgate::config::{FetcherConfig, OnError};
/// use robotgate::HttpFetcher;
/// use std::time::Duration;
///
/// let fetcher = HttpFetcher::from_config(&FetcherConfig::default()).unwrap();
/// let cache = CacheBuilder::new(fetcher)
///     .capacity(500)
///     .on_error(OnError::Reraise)
///     .error_ttl(Duration::from_secs(60))
///     .build();
/// ```
pub struct CacheBuilder<F> {
    fetcher: F,
    capacity: usize,
    ttl_policy: Arc<dyn TtlPolicy>,
    disallow_forbidden: bool,
    on_error: OnError,
    error_ttl: Duration,
}

impl<F: Fetcher> CacheBuilder<F> {
    /// Starts from the default cache configuration
    pub fn new(fetcher: F) -> Self {
        Self::from_config(fetcher, &CacheConfig::default())
    }

    /// Starts from a `[cache]` configuration section
    pub fn from_config(fetcher: F, config: &CacheConfig) -> Self {
        Self {
            fetcher,
            capacity: config.capacity,
            ttl_policy: Arc::new(HeaderWithDefaultPolicy::new(
                Duration::from_secs(config.default_ttl),
                Duration::from_secs(config.minimum_ttl),
            )),
            disallow_forbidden: config.disallow_forbidden,
            on_error: config.on_error,
            error_ttl: Duration::from_secs(config.error_ttl),
        }
    }

    /// Maximum number of hosts kept; zero is treated as one
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn ttl_policy(mut self, policy: impl TtlPolicy + 'static) -> Self {
        self.ttl_policy = Arc::new(policy);
        self
    }

    /// Whether 401/403 responses disallow everything
    pub fn disallow_forbidden(mut self, disallow: bool) -> Self {
        self.disallow_forbidden = disallow;
        self
    }

    /// What to cache when a fetch fails
    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// How long a failure outcome is cached
    pub fn error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = ttl;
        self
    }

    /// Builds a cache of whole rule sets
    pub fn build(self) -> RobotsCache {
        let policy = policy_for(self.on_error, self.error_ttl);
        self.build_with_policy(policy)
    }

    /// Builds a cache of whole rule sets with a custom failure policy
    pub fn build_with_policy(self, policy: Arc<dyn CachePolicy<Arc<RuleSet>>>) -> RobotsCache {
        let capacity = self.capacity;
        RobotsCache {
            entries: Entries::new(capacity, self.loader(policy, Arc::new)),
        }
    }

    /// Builds a cache holding only the rules for one agent
    pub fn build_agent(self, agent: &str) -> AgentCache {
        let policy = policy_for(self.on_error, self.error_ttl);
        self.build_agent_with_policy(agent, policy)
    }

    /// Builds a single-agent cache with a custom failure policy
    pub fn build_agent_with_policy(
        self,
        agent: &str,
        policy: Arc<dyn CachePolicy<Arc<Agent>>>,
    ) -> AgentCache {
        let capacity = self.capacity;
        let name = agent.to_string();
        let select = {
            let name = name.clone();
            move |rules: RuleSet| rules.agent_arc(&name).unwrap_or_default()
        };

        AgentCache {
            agent: name,
            entries: Entries::new(capacity, self.loader(policy, select)),
        }
    }

    /// Wraps fetching, parsing and the failure policy into an entry factory
    fn loader<T, S>(self, policy: Arc<dyn CachePolicy<T>>, select: S) -> Loader<T>
    where
        T: Send + 'static,
        S: Fn(RuleSet) -> T + Send + Sync + 'static,
    {
        let fetcher = Arc::new(self.fetcher);
        let ttl_policy = self.ttl_policy;
        let disallow_forbidden = self.disallow_forbidden;
        let select = Arc::new(select);

        Arc::new(move |url: String| {
            let fetcher = fetcher.clone();
            let ttl_policy = ttl_policy.clone();
            let policy = policy.clone();
            let select = select.clone();

            let load = async move {
                match fetch_rules(fetcher.as_ref(), &url, ttl_policy.as_ref(), disallow_forbidden)
                    .await
                {
                    Ok(rules) => {
                        tracing::debug!("Cached {} until {}", url, rules.expires_at());
                        (rules.expires_at(), Ok(select(rules)))
                    }
                    Err(err) => policy.exception(&url, err),
                }
            };
            Box::pin(load) as BoxFuture<Computed<T, RobotsError>>
        })
    }
}

/// A cache of parsed robots.txt rule sets, one per host
///
/// Any URL on a host can be used to look up that host's rules.
///
/// # Examples
///
/// ```no_run
/// use robotgate::config::FetcherConfig;
/// use robotgate::{HttpFetcher, RobotsCache};
///
/// # #[tokio::main]
/// # async fn main() -> robotgate::Result<()> {
/// let fetcher = HttpFetcher::from_config(&FetcherConfig::default()).unwrap();
/// let cache = RobotsCache::new(fetcher, 1000);
/// if cache.allowed("https://example.com/page", "my-bot").await? {
///     // crawl
/// }
/// # Ok(())
/// # }
/// ```
pub struct RobotsCache {
    entries: Entries<Arc<RuleSet>>,
}

impl RobotsCache {
    /// A cache with default policies holding at most `capacity` hosts
    pub fn new<F: Fetcher>(fetcher: F, capacity: usize) -> Self {
        CacheBuilder::new(fetcher).capacity(capacity).build()
    }

    /// A cache configured from a `[cache]` section
    pub fn from_config<F: Fetcher>(fetcher: F, config: &CacheConfig) -> Self {
        CacheBuilder::from_config(fetcher, config).build()
    }

    pub fn builder<F: Fetcher>(fetcher: F) -> CacheBuilder<F> {
        CacheBuilder::new(fetcher)
    }

    /// The rules for the host of `url`, fetching them if absent or expired
    pub async fn get(&self, url: &str) -> Result<Arc<RuleSet>> {
        self.entries.get(url).await
    }

    /// Re-fetches the rules for the host of `url` even if still fresh
    pub async fn refresh(&self, url: &str) -> Result<Arc<RuleSet>> {
        self.entries.refresh(url).await
    }

    /// Whether `agent` may fetch `url`
    pub async fn allowed(&self, url: &str, agent: &str) -> Result<bool> {
        Ok(self.get(url).await?.url_allowed(url, agent))
    }

    pub async fn disallowed(&self, url: &str, agent: &str) -> Result<bool> {
        Ok(!self.allowed(url, agent).await?)
    }

    /// The subset of `urls` that `agent` may fetch, in input order
    pub async fn allowed_many<S>(&self, urls: &[S], agent: &str) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        self.filter(urls, agent, true).await
    }

    /// The subset of `urls` that `agent` may not fetch, in input order
    pub async fn disallowed_many<S>(&self, urls: &[S], agent: &str) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        self.filter(urls, agent, false).await
    }

    async fn filter<S>(&self, urls: &[S], agent: &str, keep_allowed: bool) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        let mut kept = Vec::new();
        for url in urls {
            let url = url.as_ref();
            if self.allowed(url, agent).await? == keep_allowed {
                kept.push(url.to_string());
            }
        }
        Ok(kept)
    }

    /// The crawl delay `agent` should observe on the host of `url`
    pub async fn delay(&self, url: &str, agent: &str) -> Result<Option<f64>> {
        Ok(self.get(url).await?.delay(agent))
    }

    /// Sitemaps listed in the robots.txt for the host of `url`
    pub async fn sitemaps(&self, url: &str) -> Result<Vec<String>> {
        Ok(self.get(url).await?.sitemaps().to_vec())
    }

    /// Whether the host of `url` currently has an entry
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    /// Drops every cached host
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}

/// A cache of the rules for a single agent, one entry per host
///
/// Only the agent's own rules are retained, so memory stays small when a
/// crawler only ever asks about itself.
pub struct AgentCache {
    agent: String,
    entries: Entries<Arc<Agent>>,
}

impl AgentCache {
    /// A cache with default policies for `agent`
    pub fn new<F: Fetcher>(fetcher: F, agent: &str, capacity: usize) -> Self {
        CacheBuilder::new(fetcher).capacity(capacity).build_agent(agent)
    }

    pub fn from_config<F: Fetcher>(fetcher: F, agent: &str, config: &CacheConfig) -> Self {
        CacheBuilder::from_config(fetcher, config).build_agent(agent)
    }

    /// The agent name this cache answers for
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// The agent's rules for the host of `url`
    ///
    /// A host with no group for the agent and no `*` group yields empty
    /// rules, which allow everything.
    pub async fn get(&self, url: &str) -> Result<Arc<Agent>> {
        self.entries.get(url).await
    }

    pub async fn refresh(&self, url: &str) -> Result<Arc<Agent>> {
        self.entries.refresh(url).await
    }

    /// Whether the agent may fetch `url`
    pub async fn allowed(&self, url: &str) -> Result<bool> {
        Ok(self.get(url).await?.url_allowed(url))
    }

    pub async fn disallowed(&self, url: &str) -> Result<bool> {
        Ok(!self.allowed(url).await?)
    }

    /// The subset of `urls` the agent may fetch, in input order
    pub async fn allowed_many<S>(&self, urls: &[S]) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        let mut allowed = Vec::new();
        for url in urls {
            let url = url.as_ref();
            if self.allowed(url).await? {
                allowed.push(url.to_string());
            }
        }
        Ok(allowed)
    }

    /// The crawl delay on the host of `url`
    pub async fn delay(&self, url: &str) -> Result<Option<f64>> {
        Ok(self.get(url).await?.delay())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
