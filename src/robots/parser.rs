//! Robots.txt parser implementation
//!
//! This module turns the text of a robots.txt document into a [`RuleSet`]:
//! one [`Agent`] per `User-agent` group, keyed by lower-cased agent name, plus
//! the document's sitemap list.

use crate::robots::{decode_body, Agent};
use crate::ParseError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Name of the default scope used when no specific agent matches
const DEFAULT_AGENT: &str = "*";

/// A parsed robots.txt for one host
#[derive(Debug)]
pub struct RuleSet {
    url: String,
    agents: HashMap<String, Arc<Agent>>,
    sitemaps: Vec<String>,
    expires_at: DateTime<Utc>,
}

/// Consecutive `User-agent` lines being collected into one scope
struct PendingGroup {
    agent: Agent,
    names: Vec<String>,
}

impl PendingGroup {
    fn finish(self, agents: &mut HashMap<String, Arc<Agent>>) {
        let agent = Arc::new(self.agent);
        for name in self.names {
            agents.insert(name, agent.clone());
        }
    }
}

impl RuleSet {
    /// Parses robots.txt text
    ///
    /// Comments and blank lines are skipped, lines without a `:` are logged
    /// and skipped, and unknown directives are ignored. Consecutive
    /// `User-agent` lines share one scope; any other line in between,
    /// recognized or not, ends the group.
    ///
    /// # Arguments
    ///
    /// * `url` - The robots.txt URL the content came from
    /// * `content` - The document text
    /// * `expires_at` - When the parsed rules should be refreshed
    ///
    /// # Returns
    ///
    /// * `Ok(RuleSet)` - The parsed rules
    /// * `Err(ParseError)` - An `Allow`, `Disallow` or `Crawl-delay` line appeared before any `User-agent`
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use robotgate::RuleSet;
    ///
    /// let content = "User-agent: *\nDisallow: /private*/\n";
    /// let rules = RuleSet::parse("http://example.com/robots.txt", content, Utc::now()).unwrap();
    /// assert!(!rules.allowed("/private/x", "anybot"));
    /// assert!(rules.allowed("/privateXYZ", "anybot"));
    /// ```
    pub fn parse(
        url: &str,
        content: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        let mut agents: HashMap<String, Arc<Agent>> = HashMap::new();
        let mut sitemaps = Vec::new();
        let mut current: Option<PendingGroup> = None;
        let mut last_key = String::new();

        let lines = content
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split('\r').map(move |part| (index + 1, part)));

        for (line_number, raw_line) in lines {
            let line = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                tracing::warn!(
                    "Skipping line {} of {} without a colon: {:?}",
                    line_number,
                    url,
                    line
                );
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" | "useragent" => {
                    let name = value.to_lowercase();
                    current = Some(match current.take() {
                        Some(mut group) if is_user_agent_key(&last_key) => {
                            group.names.push(name);
                            group
                        }
                        previous => {
                            if let Some(group) = previous {
                                group.finish(&mut agents);
                            }
                            PendingGroup {
                                agent: Agent::new(),
                                names: vec![name],
                            }
                        }
                    });
                }
                "allow" | "disallow" => {
                    let group = current.as_mut().ok_or_else(|| {
                        ParseError::DirectiveBeforeUserAgent {
                            line: line_number,
                            directive: key.clone(),
                        }
                    })?;
                    if key == "allow" {
                        group.agent.allow(value);
                    } else {
                        group.agent.disallow(value);
                    }
                }
                "crawl-delay" => {
                    let group = current.as_mut().ok_or_else(|| {
                        ParseError::DirectiveBeforeUserAgent {
                            line: line_number,
                            directive: key.clone(),
                        }
                    })?;
                    match parse_delay(value) {
                        Some(delay) => {
                            group.agent.set_delay(Some(delay));
                        }
                        None => {
                            tracing::warn!("Could not parse crawl delay in {}: {:?}", url, value);
                        }
                    }
                }
                "sitemap" => sitemaps.push(value.to_string()),
                _ => {
                    tracing::debug!("Unknown directive {:?} in {}", key, url);
                }
            }

            last_key = key;
        }

        if let Some(group) = current.take() {
            group.finish(&mut agents);
        }

        Ok(Self {
            url: url.to_string(),
            agents,
            sitemaps,
            expires_at,
        })
    }

    /// Parses a raw robots.txt body, sniffing its byte-order mark
    pub fn parse_bytes(
        url: &str,
        content: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        Self::parse(url, &decode_body(content), expires_at)
    }

    /// A rule set that disallows every path for every agent
    pub fn allow_none(url: &str, expires_at: DateTime<Utc>) -> Self {
        let mut agent = Agent::new();
        agent.disallow("/");

        let mut agents = HashMap::new();
        agents.insert(DEFAULT_AGENT.to_string(), Arc::new(agent));

        Self {
            url: url.to_string(),
            agents,
            sitemaps: Vec::new(),
            expires_at,
        }
    }

    /// A rule set that allows every path for every agent
    pub fn allow_all(url: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            agents: HashMap::new(),
            sitemaps: Vec::new(),
            expires_at,
        }
    }

    /// The robots.txt URL these rules came from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sitemap URLs in document order
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// When these rules should be refreshed
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once the expiration time has passed
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Time left before expiration, zero once expired
    pub fn ttl(&self) -> Duration {
        (self.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }

    /// Finds the rules that apply to an agent
    ///
    /// Lookup is case-insensitive. A full user-agent string such as
    /// `MyBot/2.1 (+https://example.com)` also matches a group named after
    /// its product token (`mybot`). Unknown agents fall back to the `*`
    /// group; `None` means no rules apply at all.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.lookup(name).map(|agent| agent.as_ref())
    }

    /// Shared handle to the rules for an agent, see [`RuleSet::agent`]
    pub fn agent_arc(&self, name: &str) -> Option<Arc<Agent>> {
        self.lookup(name).cloned()
    }

    fn lookup(&self, name: &str) -> Option<&Arc<Agent>> {
        let name = name.trim().to_lowercase();
        let product = name.split('/').next().unwrap_or_default().trim();

        self.agents
            .get(&name)
            .or_else(|| self.agents.get(product))
            .or_else(|| self.agents.get(DEFAULT_AGENT))
    }

    /// Checks whether an agent may fetch a path
    pub fn allowed(&self, path: &str, agent: &str) -> bool {
        self.agent(agent).map_or(true, |found| found.allowed(path))
    }

    /// Checks whether an agent may fetch the path of a full URL
    pub fn url_allowed(&self, url: &str, agent: &str) -> bool {
        self.agent(agent).map_or(true, |found| found.url_allowed(url))
    }

    /// The crawl delay that applies to an agent
    pub fn delay(&self, agent: &str) -> Option<f64> {
        self.agent(agent).and_then(|found| found.delay())
    }
}

fn is_user_agent_key(key: &str) -> bool {
    key == "user-agent" || key == "useragent"
}

fn parse_delay(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|delay| delay.is_finite() && *delay >= 0.0)
}
