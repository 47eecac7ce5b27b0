//! Rules for a single crawler identity
//!
//! An agent collects the directives of one `User-agent` group. Directives are
//! kept in insertion order and sorted by descending priority the first time
//! the agent is queried after a change, so the longest matching rule decides.

use crate::robots::Directive;
use crate::url::{extract_path, sanitize_path};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// The path that is always fetchable, whatever the rules say
const ROBOTS_PATH: &str = "/robots.txt";

/// The directives and crawl delay for one user agent
#[derive(Debug)]
pub struct Agent {
    directives: RwLock<Vec<Directive>>,
    /// Cleared on every insertion; set once the directives are re-sorted
    sorted: AtomicBool,
    delay: Option<f64>,
}

impl Agent {
    /// Creates an agent with no directives and no crawl delay
    pub fn new() -> Self {
        Self {
            directives: RwLock::new(Vec::new()),
            sorted: AtomicBool::new(true),
            delay: None,
        }
    }

    /// Adds an `Allow` directive
    ///
    /// # Examples
    ///
    /// ```
    /// use robotgate::Agent;
    ///
    /// let mut agent = Agent::new();
    /// agent.disallow("/path").allow("/path/exception");
    /// assert!(agent.allowed("/path/exception"));
    /// assert!(!agent.allowed("/path"));
    /// ```
    pub fn allow(&mut self, rule: &str) -> &mut Self {
        self.push(Directive::allow(rule))
    }

    /// Adds a `Disallow` directive
    ///
    /// An empty rule means "disallow nothing" and is stored as an allow-all
    /// directive.
    pub fn disallow(&mut self, rule: &str) -> &mut Self {
        if rule.trim().is_empty() {
            self.push(Directive::allow(rule))
        } else {
            self.push(Directive::disallow(rule))
        }
    }

    fn push(&mut self, directive: Directive) -> &mut Self {
        self.directives.get_mut().push(directive);
        *self.sorted.get_mut() = false;
        self
    }

    /// Sets the crawl delay in seconds
    pub fn set_delay(&mut self, delay: Option<f64>) -> &mut Self {
        self.delay = delay;
        self
    }

    /// The crawl delay in seconds, if one was given
    pub fn delay(&self) -> Option<f64> {
        self.delay
    }

    /// Returns the directives in precedence order
    pub fn directives(&self) -> Vec<Directive> {
        self.ensure_sorted();
        self.directives.read().clone()
    }

    /// Checks whether a path may be fetched
    ///
    /// `/robots.txt` is always allowed. Otherwise the path is sanitized and
    /// the highest-priority matching directive decides; a path no directive
    /// matches is allowed.
    pub fn allowed(&self, path: &str) -> bool {
        if path == ROBOTS_PATH {
            return true;
        }

        let sanitized = sanitize_path(path);
        self.ensure_sorted();

        let directives = self.directives.read();
        directives
            .iter()
            .find(|directive| directive.matches(&sanitized))
            .map_or(true, |directive| directive.allowed())
    }

    /// Checks whether the path of a full URL may be fetched
    pub fn url_allowed(&self, url: &str) -> bool {
        self.allowed(&extract_path(url))
    }

    fn ensure_sorted(&self) {
        if self.sorted.load(Ordering::Acquire) {
            return;
        }

        let mut directives = self.directives.write();
        if !self.sorted.load(Ordering::Acquire) {
            // Stable sort keeps insertion order among equal priorities
            directives.sort_by(|a, b| b.priority().cmp(&a.priority()));
            self.sorted.store(true, Ordering::Release);
        }
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}
