//! # Host Bridge Traits
//!
//! Seams between the harvester core and the host it runs on.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - One round trip per call, buffered or streamed
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Directory creation and file I/O
//! - [`BrowserLauncher`](browser::BrowserLauncher) - Opens the OAuth authorization URL
//! - [`KnowledgeBaseIngestor`](ingest::KnowledgeBaseIngestor) - Forwards downloaded documents
//!
//! Desktop implementations live in `bridge-desktop`; the ingestion client
//! lives in `provider-bedrock`.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map wire-level failures to `Network`/`Timeout` so callers can decide
//! whether to retry via [`BridgeError::is_transient`].
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`.

pub mod browser;
pub mod error;
pub mod http;
pub mod ingest;
pub mod storage;

pub use error::BridgeError;

pub use browser::BrowserLauncher;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpStream, RetryPolicy};
pub use ingest::{IngestReceipt, IngestRequest, KnowledgeBaseIngestor};
pub use storage::FileSystemAccess;
