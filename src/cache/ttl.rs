//! Policies for deciding how long fetched rules stay cached
//!
//! The header-based policy follows HTTP caching semantics: `Cache-Control`
//! takes precedence over `Expires`, and every derived TTL is clamped to a
//! configured minimum so that a host cannot force constant re-fetching.

use crate::fetcher::FetchResponse;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

/// TTL used when the response carries no caching hints
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Lower bound applied to every header-derived TTL
pub const MINIMUM_TTL: Duration = Duration::from_secs(600);

/// Decides how long a fetched robots.txt stays fresh
pub trait TtlPolicy: Send + Sync {
    /// Caching TTL for a response
    fn ttl(&self, response: &FetchResponse) -> Duration;

    /// When a response fetched now should expire
    fn expires(&self, response: &FetchResponse) -> DateTime<Utc> {
        expires_after(self.ttl(response))
    }
}

/// Computes `now + ttl`, saturating at the latest representable time
pub fn expires_after(ttl: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// TTL from `Cache-Control`/`Expires` headers, with a default and a floor
///
/// # Examples
///
/// ```
/// use robotgate::{FetchResponse, HeaderWithDefaultPolicy, TtlPolicy};
/// use std::collections::HashMap;
/// use std::time::Duration;
///
/// let policy = HeaderWithDefaultPolicy::new(Duration::from_secs(20), Duration::from_secs(10));
/// let mut headers = HashMap::new();
/// headers.insert("Cache-Control".to_string(), "max-age=15".to_string());
/// let response = FetchResponse::new(200, headers, Vec::new());
/// assert_eq!(policy.ttl(&response), Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderWithDefaultPolicy {
    default: Duration,
    minimum: Duration,
}

impl HeaderWithDefaultPolicy {
    /// Creates a policy with the given default and minimum TTLs
    pub fn new(default: Duration, minimum: Duration) -> Self {
        Self { default, minimum }
    }

    /// The TTL used when headers say nothing
    pub fn default_ttl(&self) -> Duration {
        self.default
    }

    /// The floor applied to header-derived TTLs
    pub fn minimum_ttl(&self) -> Duration {
        self.minimum
    }

    /// Computes the TTL relative to `now`
    ///
    /// `now` stands in for the `Date` header when that is missing or
    /// unparseable.
    pub fn ttl_at(&self, response: &FetchResponse, now: DateTime<Utc>) -> Duration {
        if let Some(cache_control) = response.header("cache-control") {
            let mut max_age = None;
            let mut s_maxage = None;

            for directive in cache_control.split(',') {
                let (name, value) = match directive.split_once('=') {
                    Some((name, value)) => (name, Some(value.trim().trim_matches('"'))),
                    None => (directive, None),
                };

                match (name.trim().to_lowercase().as_str(), value) {
                    ("no-store", _) | ("must-revalidate", _) | ("no-cache", None) => {
                        return self.minimum;
                    }
                    ("s-maxage", Some(value)) => match value.parse::<i64>() {
                        Ok(seconds) => s_maxage = Some(seconds),
                        Err(_) => tracing::warn!("Could not parse s-maxage={}", value),
                    },
                    ("max-age", Some(value)) => match value.parse::<i64>() {
                        Ok(seconds) => max_age = Some(seconds),
                        Err(_) => tracing::warn!("Could not parse max-age={}", value),
                    },
                    _ => {}
                }
            }

            if let Some(seconds) = s_maxage.or(max_age) {
                return self.clamp(seconds);
            }
        }

        if let Some(expires) = response.header("expires") {
            let date = response
                .header("date")
                .and_then(|date| {
                    let parsed = parse_http_date(date);
                    if parsed.is_none() {
                        tracing::warn!("Could not parse Date header {:?}", date);
                    }
                    parsed
                })
                .unwrap_or(now);

            match parse_http_date(expires) {
                Some(expires) => return self.clamp((expires - date).num_seconds()),
                None => tracing::warn!("Could not parse Expires header {:?}", expires),
            }
        }

        self.default
    }

    fn clamp(&self, seconds: i64) -> Duration {
        Duration::from_secs(seconds.max(0) as u64).max(self.minimum)
    }
}

impl Default for HeaderWithDefaultPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, MINIMUM_TTL)
    }
}

impl TtlPolicy for HeaderWithDefaultPolicy {
    fn ttl(&self, response: &FetchResponse) -> Duration {
        self.ttl_at(response, Utc::now())
    }
}

/// Parses an HTTP date (RFC 7231: IMF-fixdate, RFC 850, or asctime)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
