//! Robots.txt handling module
//!
//! This module provides the rules engine: directives, per-agent rule groups,
//! the document parser, and the mapping from a fetched robots.txt response
//! to a rule set.

mod agent;
mod directive;
mod encoding;
mod parser;

pub use agent::Agent;
pub use directive::Directive;
pub use encoding::decode_body;
pub use parser::RuleSet;

use crate::cache::TtlPolicy;
use crate::fetcher::{FetchResponse, Fetcher};
use crate::{FetchError, RobotsError};
use chrono::{DateTime, Utc};

/// Fetches and parses the robots.txt at `url`, without caching
///
/// # Arguments
///
/// * `fetcher` - The transport used to retrieve the document
/// * `url` - The robots.txt URL
/// * `ttl_policy` - Decides when the parsed rules expire
/// * `disallow_forbidden` - Whether 401/403 means "disallow everything"
///
/// # Returns
///
/// * `Ok(RuleSet)` - Parsed or synthesized rules
/// * `Err(RobotsError)` - Transport failure, 5xx status, or a malformed document
pub async fn fetch_rules<F: Fetcher>(
    fetcher: &F,
    url: &str,
    ttl_policy: &dyn TtlPolicy,
    disallow_forbidden: bool,
) -> Result<RuleSet, RobotsError> {
    tracing::debug!("Fetching {}", url);
    let response = fetcher.fetch(url).await?;
    let expires_at = ttl_policy.expires(&response);
    rules_from_response(url, &response, expires_at, disallow_forbidden)
}

/// Maps a fetched robots.txt response to a rule set
///
/// | Status | Result |
/// |--------|--------|
/// | 200 | Body parsed |
/// | 401, 403 | Disallow everything (allow everything if `disallow_forbidden` is false) |
/// | Other 4xx | Allow everything |
/// | 5xx | `FetchError::BadStatus` |
/// | Anything else | `FetchError::UnexpectedStatus` |
pub fn rules_from_response(
    url: &str,
    response: &FetchResponse,
    expires_at: DateTime<Utc>,
    disallow_forbidden: bool,
) -> Result<RuleSet, RobotsError> {
    match response.status {
        200 => Ok(RuleSet::parse_bytes(url, &response.body, expires_at)?),
        401 | 403 => {
            tracing::info!("Access forbidden to {} ({})", url, response.status);
            if disallow_forbidden {
                Ok(RuleSet::allow_none(url, expires_at))
            } else {
                Ok(RuleSet::allow_all(url, expires_at))
            }
        }
        400..=499 => {
            tracing::info!("Assuming unrestricted access to {} ({})", url, response.status);
            Ok(RuleSet::allow_all(url, expires_at))
        }
        status if status >= 500 => Err(FetchError::BadStatus {
            url: url.to_string(),
            status,
        }
        .into()),
        status => Err(FetchError::UnexpectedStatus {
            url: url.to_string(),
            status,
        }
        .into()),
    }
}
