//! Shared utilities for stock-dash
//!
//! This crate provides common functionality used across the stock-dash workspace:
//! logging setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
