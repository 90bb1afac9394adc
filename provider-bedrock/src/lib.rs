//! # Bedrock Knowledge-Base Provider
//!
//! Forwards downloaded documents to a knowledge-base data source as custom
//! in-line content. Requests are signed with AWS Signature Version 4 using
//! static credentials from the environment.

pub mod client;
pub mod error;
pub mod payload;
pub mod sigv4;

pub use client::{BedrockIngestor, INGEST_TIMEOUT, SERVICE_NAME};
pub use error::{IngestionError, Result};
pub use sigv4::{AwsCredentials, SigV4Signer};
