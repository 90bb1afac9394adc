//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the document harvester:
//! - Logging bootstrap and explicit per-component logging contexts
//! - Configuration loading from the environment, `.env` files and overrides
//!
//! Every other core crate receives a [`LogContext`](logging::LogContext) and
//! its settings at construction time; nothing in this crate is read lazily
//! from global state after startup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ConfigReport, HarvestConfig, IngestionSettings, SharePointSettings};
pub use error::{Error, Result};
pub use logging::{LogContext, LogFormat, LogLevel, LoggingConfig};
