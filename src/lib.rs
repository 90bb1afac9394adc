//! SharePoint document harvester.
//!
//! The binary in `src/main.rs` is a thin command line front end over the
//! workspace crates. Library users enable the `desktop-shims` feature (on by
//! default) and get the [`Harvester`] façade re-exported here, so a single
//! dependency on `docharvest` is enough to scan, download and ingest.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

pub use core_runtime::config::{load_dotenv, validate_environment, ConfigReport};
pub use core_runtime::logging::{init_logging, LogContext, LogLevel, LoggingConfig};
