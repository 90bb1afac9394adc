//! # Transfer Module
//!
//! Moves harvested documents from SharePoint to the local disk.
//!
//! ## Components
//!
//! - **Transfer Engine** (`engine`): one document, deterministic destination
//!   path, direct or authenticated URL, bounded retries, optional ingestion
//! - **Batch Orchestrator** (`batch`): sequential runs with progress reporting

pub mod batch;
pub mod engine;
pub mod error;

pub use batch::{BatchOrchestrator, BatchReport, ProgressFn};
pub use engine::{
    destination_path, DownloadSource, TransferEngine, CONTENT_TIMEOUT, DIRECT_URL_TTL_MINUTES,
    INGEST_SOURCE,
};
pub use error::{DownloadError, Result};
