//! Request and response bodies of the knowledge-base `IngestKnowledgeBaseDocuments` call.
//!
//! Documents are sent as custom in-line byte content with two in-line
//! metadata attributes, `title` and `source`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::ingest::IngestRequest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestDocumentsBody {
    pub documents: Vec<KnowledgeBaseDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseDocument {
    pub content: DocumentContent,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub data_source_type: &'static str,
    pub custom: CustomContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomContent {
    pub custom_document_identifier: DocumentIdentifier,
    pub inline_content: InlineContent,
    pub source_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentIdentifier {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineContent {
    pub byte_content: ByteContent,
    #[serde(rename = "type")]
    pub content_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteContent {
    /// Base64 of the raw file bytes
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub inline_attributes: Vec<MetadataAttribute>,
    #[serde(rename = "type")]
    pub metadata_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataAttribute {
    pub key: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub string_value: String,
}

impl MetadataAttribute {
    fn string(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: AttributeValue {
                string_value: value.to_string(),
            },
        }
    }
}

impl IngestDocumentsBody {
    /// Body carrying a single document.
    pub fn single(request: &IngestRequest) -> Self {
        let document = KnowledgeBaseDocument {
            content: DocumentContent {
                data_source_type: "CUSTOM",
                custom: CustomContent {
                    custom_document_identifier: DocumentIdentifier {
                        id: request.document_id.clone(),
                    },
                    inline_content: InlineContent {
                        byte_content: ByteContent {
                            data: STANDARD.encode(&request.content),
                            mime_type: request.mime_type.clone(),
                        },
                        content_type: "BYTE",
                    },
                    source_type: "IN_LINE",
                },
            },
            metadata: DocumentMetadata {
                inline_attributes: vec![
                    MetadataAttribute::string("title", &request.title),
                    MetadataAttribute::string("source", &request.source),
                ],
                metadata_type: "IN_LINE_ATTRIBUTE",
            },
        };

        Self {
            documents: vec![document],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestDocumentsResponse {
    #[serde(default)]
    pub document_details: Vec<DocumentDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    #[test]
    fn test_body_shape() {
        let request = IngestRequest {
            document_id: "plan.pdf".into(),
            title: "plan.pdf".into(),
            source: "SharePoint".into(),
            mime_type: "application/pdf".into(),
            content: Bytes::from_static(b"hello"),
        };

        let body = serde_json::to_value(IngestDocumentsBody::single(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "documents": [{
                    "content": {
                        "dataSourceType": "CUSTOM",
                        "custom": {
                            "customDocumentIdentifier": {"id": "plan.pdf"},
                            "inlineContent": {
                                "byteContent": {"data": "aGVsbG8=", "mimeType": "application/pdf"},
                                "type": "BYTE"
                            },
                            "sourceType": "IN_LINE"
                        }
                    },
                    "metadata": {
                        "inlineAttributes": [
                            {"key": "title", "value": {"stringValue": "plan.pdf"}},
                            {"key": "source", "value": {"stringValue": "SharePoint"}}
                        ],
                        "type": "IN_LINE_ATTRIBUTE"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_response_status() {
        let response: IngestDocumentsResponse = serde_json::from_str(
            r#"{"documentDetails":[{"status":"STARTING","knowledgeBaseId":"KB"}]}"#,
        )
        .unwrap();
        assert_eq!(response.document_details[0].status.as_deref(), Some("STARTING"));
    }
}
