//! Knowledge-Base Ingestion Abstraction
//!
//! After a document lands on disk it may be forwarded to a managed
//! knowledge-base service. The transfer engine only sees this trait.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One document submitted for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    /// Caller-assigned identifier; re-ingesting the same id replaces the document
    pub document_id: String,
    pub title: String,
    /// Free-form origin label stored as a metadata attribute
    pub source: String,
    pub mime_type: String,
    pub content: Bytes,
}

/// Service acknowledgement for an accepted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: String,
    /// Status string reported by the service, e.g. `STARTING`
    pub status: String,
}

#[async_trait]
pub trait KnowledgeBaseIngestor: Send + Sync {
    async fn ingest(&self, request: IngestRequest) -> Result<IngestReceipt>;
}
