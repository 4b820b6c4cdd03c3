//! Configuration module for Ripple-BFS
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional; missing keys take the documented defaults.
//!
//! # Example
//!
//! ```no_run
//! use ripple_bfs::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.page_budget);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_SEED};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_seed};
