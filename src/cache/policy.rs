//! What the cache stores when fetching a robots.txt fails

use crate::cache::entry::Computed;
use crate::cache::ttl::expires_after;
use crate::config::OnError;
use crate::robots::{Agent, RuleSet};
use crate::RobotsError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// How long a failure outcome is cached by default
pub const ERROR_TTL: Duration = Duration::from_secs(600);

/// Turns a failed fetch into a cached outcome
pub trait CachePolicy<T>: Send + Sync {
    /// Decides what to cache for `url` after `error`, and until when
    fn exception(&self, url: &str, error: RobotsError) -> Computed<T, RobotsError>;
}

/// Caches the error itself, so callers see it until the entry expires
#[derive(Debug, Clone, Copy)]
pub struct ReraiseExceptionPolicy {
    ttl: Duration,
}

impl ReraiseExceptionPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl<T> CachePolicy<T> for ReraiseExceptionPolicy {
    fn exception(&self, url: &str, error: RobotsError) -> Computed<T, RobotsError> {
        tracing::error!("Robots.txt unavailable at {}: {}", url, error);
        (expires_after(self.ttl), Err(error))
    }
}

/// Caches a substitute value built from the URL and expiration time
pub struct DefaultObjectPolicy<T> {
    ttl: Duration,
    factory: Arc<dyn Fn(&str, DateTime<Utc>) -> T + Send + Sync>,
}

impl<T> DefaultObjectPolicy<T> {
    /// Uses `factory` to build the substitute value
    pub fn new<F>(ttl: Duration, factory: F) -> Self
    where
        F: Fn(&str, DateTime<Utc>) -> T + Send + Sync + 'static,
    {
        Self {
            ttl,
            factory: Arc::new(factory),
        }
    }
}

impl<T: Fallback> DefaultObjectPolicy<T> {
    /// Substitutes rules that disallow everything
    pub fn allow_none(ttl: Duration) -> Self {
        Self::new(ttl, T::allow_none)
    }

    /// Substitutes rules that allow everything
    pub fn allow_all(ttl: Duration) -> Self {
        Self::new(ttl, T::allow_all)
    }
}

impl<T> CachePolicy<T> for DefaultObjectPolicy<T> {
    fn exception(&self, url: &str, error: RobotsError) -> Computed<T, RobotsError> {
        tracing::info!("Robots.txt unavailable at {}, using default: {}", url, error);
        let expires_at = expires_after(self.ttl);
        (expires_at, Ok((self.factory)(url, expires_at)))
    }
}

impl<T> std::fmt::Debug for DefaultObjectPolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultObjectPolicy")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Cached values that have a permissive and a restrictive stand-in
pub trait Fallback: Sized + Send + Sync + 'static {
    fn allow_none(url: &str, expires_at: DateTime<Utc>) -> Self;
    fn allow_all(url: &str, expires_at: DateTime<Utc>) -> Self;
}

impl Fallback for Arc<RuleSet> {
    fn allow_none(url: &str, expires_at: DateTime<Utc>) -> Self {
        Arc::new(RuleSet::allow_none(url, expires_at))
    }

    fn allow_all(url: &str, expires_at: DateTime<Utc>) -> Self {
        Arc::new(RuleSet::allow_all(url, expires_at))
    }
}

impl Fallback for Arc<Agent> {
    fn allow_none(_url: &str, _expires_at: DateTime<Utc>) -> Self {
        let mut agent = Agent::new();
        agent.disallow("/");
        Arc::new(agent)
    }

    fn allow_all(_url: &str, _expires_at: DateTime<Utc>) -> Self {
        Arc::new(Agent::new())
    }
}

/// Builds the failure policy named by an `on-error` setting
pub fn policy_for<T: Fallback>(on_error: OnError, ttl: Duration) -> Arc<dyn CachePolicy<T>> {
    match on_error {
        OnError::AllowNone => Arc::new(DefaultObjectPolicy::<T>::allow_none(ttl)),
        OnError::AllowAll => Arc::new(DefaultObjectPolicy::<T>::allow_all(ttl)),
        OnError::Reraise => Arc::new(ReraiseExceptionPolicy::new(ttl)),
    }
}
