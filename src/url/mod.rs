//! URL handling module for Robotgate
//!
//! This module derives the canonical robots.txt URL used as a cache key,
//! extracts the path component that rules are matched against, and
//! canonicalizes paths and rule patterns so that both sides compare equal.

mod path;
mod robots_url;

// Re-export main functions
pub use path::{extract_path, sanitize_path};
pub use robots_url::robots_url;
