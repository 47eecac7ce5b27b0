//! Expiring, bounded caching of robots.txt rules
//!
//! - [`ExpiringEntry`]: a memoized value that recomputes itself on expiry
//! - [`TtlPolicy`]: how long fetched rules stay fresh
//! - [`CachePolicy`]: what is cached when a fetch fails
//! - [`RobotsCache`] / [`AgentCache`]: per-host LRU caches built on the above

mod entry;
mod policy;
mod store;
mod ttl;

pub use entry::{BoxFuture, Computed, ExpiringEntry};
pub use policy::{
    policy_for, CachePolicy, DefaultObjectPolicy, Fallback, ReraiseExceptionPolicy, ERROR_TTL,
};
pub use store::{AgentCache, CacheBuilder, RobotsCache};
pub use ttl::{
    expires_after, parse_http_date, HeaderWithDefaultPolicy, TtlPolicy, DEFAULT_TTL, MINIMUM_TTL,
};
