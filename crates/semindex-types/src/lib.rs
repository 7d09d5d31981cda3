//! # semindex-types
//!
//! Shared domain types for the semindex vector engine.
//!
//! This crate defines the pieces every other crate agrees on:
//! - Distance metric selection for the ANN backend
//! - Layered settings (defaults -> config file -> env vars)
//! - Configuration error type
//!
//! ## Usage
//!
//! ```rust
//! use semindex_types::{DistanceMetric, Settings};
//!
//! let settings = Settings::default();
//! assert_eq!(settings.metric, DistanceMetric::Euclidean);
//! ```

pub mod config;
pub mod error;
pub mod metric;

pub use config::Settings;
pub use error::ConfigError;
pub use metric::DistanceMetric;
