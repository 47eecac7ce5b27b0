//! Configuration module for Robotgate
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use robotgate::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("robotgate.toml")).unwrap();
//! println!("Cache capacity: {}", config.cache.capacity);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, FetcherConfig, OnError};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
