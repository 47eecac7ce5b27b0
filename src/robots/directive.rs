//! Single allow/disallow rules
//!
//! A directive pairs a sanitized pattern with an allowed flag and a priority.
//! Priority is the length of the rule text as written, which makes the most
//! specific (longest) rule win when several match the same path.

use crate::url::sanitize_path;
use regex::Regex;
use std::fmt;

/// How a directive decides whether a sanitized path matches
#[derive(Debug, Clone)]
enum Matcher {
    /// Matches every path (`""`, `/`, `*`)
    All,
    /// Literal prefix comparison against the sanitized pattern
    Prefix,
    /// Compiled wildcard pattern, anchored at the start of the path
    Pattern(Regex),
    /// The pattern could not be compiled; matches nothing
    Never,
}

/// One allow or disallow rule
#[derive(Debug, Clone)]
pub struct Directive {
    priority: usize,
    pattern: String,
    allowed: bool,
    matcher: Matcher,
}

impl Directive {
    /// Builds a directive from the raw rule text
    ///
    /// # Arguments
    ///
    /// * `rule` - The value of an `Allow`/`Disallow` line, unsanitized
    /// * `allowed` - Whether a match permits the path
    ///
    /// # Examples
    ///
    /// ```
    /// use robotgate::Directive;
    ///
    /// let directive = Directive::new("/*.gif$", false);
    /// assert_eq!(directive.priority(), 7);
    /// assert!(directive.matches("/funny.gif"));
    /// assert!(!directive.matches("/funny.gifs/path"));
    /// ```
    pub fn new(rule: &str, allowed: bool) -> Self {
        let rule = rule.trim();
        let priority = rule.chars().count();
        let pattern = sanitize_path(rule);

        let matcher = if rule.is_empty() || rule == "/" || rule == "*" {
            Matcher::All
        } else if !pattern.contains('*') && !pattern.contains('$') {
            Matcher::Prefix
        } else {
            match compile_pattern(&pattern) {
                Ok(regex) => Matcher::Pattern(regex),
                Err(e) => {
                    tracing::warn!("Could not compile rule pattern {:?}: {}", rule, e);
                    Matcher::Never
                }
            }
        };

        Self {
            priority,
            pattern,
            allowed,
            matcher,
        }
    }

    /// Builds an allowing directive
    pub fn allow(rule: &str) -> Self {
        Self::new(rule, true)
    }

    /// Builds a disallowing directive
    pub fn disallow(rule: &str) -> Self {
        Self::new(rule, false)
    }

    /// Length of the original rule text
    pub fn priority(&self) -> usize {
        self.priority
    }

    /// The sanitized pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether a matching path is allowed
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Checks a sanitized path against this directive
    pub fn matches(&self, sanitized: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Prefix => sanitized.starts_with(&self.pattern),
            Matcher::Pattern(regex) => regex.is_match(sanitized),
            Matcher::Never => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self.matcher {
            Matcher::All => "All",
            Matcher::Prefix => "Prefix",
            Matcher::Pattern(_) => "Pattern",
            Matcher::Never => "Never",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} priority={}, pattern={}, allowed={}>",
            self.kind(),
            self.priority,
            self.pattern,
            self.allowed
        )
    }
}

/// Compiles a wildcard pattern into an anchored regex
///
/// Runs of `*` collapse to one before escaping; `*` then becomes `.*` and
/// `$` becomes an end anchor.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }

    let escaped = regex::escape(&collapsed)
        .replace(r"\*", ".*")
        .replace(r"\$", "$");

    Regex::new(&format!("(?s)^{}", escaped))
}
