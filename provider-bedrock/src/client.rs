//! Knowledge-base ingestion client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::ingest::{IngestReceipt, IngestRequest, KnowledgeBaseIngestor};
use chrono::Utc;
use core_runtime::config::IngestionSettings;
use core_runtime::logging::LogContext;
use tracing::{debug, info, warn, Instrument};

use crate::error::{IngestionError, Result};
use crate::payload::{IngestDocumentsBody, IngestDocumentsResponse};
use crate::sigv4::{AwsCredentials, SigV4Signer};

/// Signing name of the knowledge-base agent API.
pub const SERVICE_NAME: &str = "bedrock";

pub const INGEST_TIMEOUT: Duration = Duration::from_secs(60);

const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Submits documents to one knowledge-base data source.
///
/// # Example
///
/// ```ignore
/// use provider_bedrock::{AwsCredentials, BedrockIngestor};
///
/// let ingestor = BedrockIngestor::new(http, &settings, AwsCredentials::from_env()?, log);
/// let receipt = ingestor.ingest_document(request).await?;
/// println!("{} -> {}", receipt.document_id, receipt.status);
/// ```
pub struct BedrockIngestor {
    http_client: Arc<dyn HttpClient>,
    signer: SigV4Signer,
    knowledge_base_id: String,
    data_source_id: String,
    log: LogContext,
}

impl BedrockIngestor {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        settings: &IngestionSettings,
        credentials: AwsCredentials,
        log: LogContext,
    ) -> Self {
        Self {
            http_client,
            signer: SigV4Signer::new(credentials, &settings.region, SERVICE_NAME),
            knowledge_base_id: settings.knowledge_base_id.clone(),
            data_source_id: settings.data_source_id.clone(),
            log: log.component("ingest"),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "https://bedrock-agent.{}.amazonaws.com/knowledgebases/{}/datasources/{}/documents",
            self.signer.region(),
            self.knowledge_base_id,
            self.data_source_id
        )
    }

    /// Submit one document.
    ///
    /// # Errors
    ///
    /// - [`IngestionError::Rejected`] for any non-2xx answer
    /// - [`IngestionError::Bridge`] when the request never got an answer
    pub async fn ingest_document(&self, request: IngestRequest) -> Result<IngestReceipt> {
        let span = self.log.operation("ingest");
        async {
            let body = IngestDocumentsBody::single(&request);
            let http_request = HttpRequest::new(HttpMethod::Put, self.endpoint())
                .json(&body)?
                .accept("application/json")
                .timeout(INGEST_TIMEOUT);
            let signed = self.signer.sign(http_request, Utc::now())?;

            debug!(
                document = %request.document_id,
                bytes = request.content.len(),
                "Submitting document for ingestion"
            );
            let response = self.http_client.execute(signed).await?;

            if !response.is_success() {
                let message = response.text_lossy();
                warn!(
                    document = %request.document_id,
                    status = response.status,
                    error = %message,
                    "Ingestion rejected"
                );
                return Err(IngestionError::Rejected {
                    status: response.status,
                    message,
                });
            }

            let parsed: IngestDocumentsResponse = if response.body.is_empty() {
                IngestDocumentsResponse::default()
            } else {
                serde_json::from_slice(&response.body)
                    .map_err(|e| IngestionError::InvalidResponse(e.to_string()))?
            };
            let detail = parsed.document_details.into_iter().next();
            if let Some(reason) = detail.as_ref().and_then(|d| d.status_reason.as_deref()) {
                debug!(reason = %reason, "Ingestion status reason");
            }
            let status = detail
                .and_then(|d| d.status)
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

            info!(document = %request.document_id, status = %status, "Document ingested");
            Ok(IngestReceipt {
                document_id: request.document_id,
                status,
            })
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl KnowledgeBaseIngestor for BedrockIngestor {
    async fn ingest(&self, request: IngestRequest) -> BridgeResult<IngestReceipt> {
        Ok(self.ingest_document(request).await?)
    }
}
