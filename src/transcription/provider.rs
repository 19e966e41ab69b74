//! Transcription provider trait and types
//!
//! Defines the common interface for all transcription backends (hosted Gradio
//! Space, placeholder)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::annotation::Transcript;

/// Error types for transcription calls
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// The call did not finish within the configured timeout
    #[error("Transcription timed out after {0:?}")]
    Timeout(Duration),
    /// Provider could not be reached
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    /// Provider was reached but the request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// Provider answered with something that is not a token list
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The image could not be read
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// A request to transcribe one document image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Absolute path of the image on disk
    pub image_path: PathBuf,
    /// Comma-separated entity labels, e.g. `person, location`
    pub labels: String,
    /// Model identifier understood by the provider
    pub model: String,
}

/// The trait all transcription providers implement
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Get the provider name (e.g., "gradio", "placeholder")
    fn provider_name(&self) -> &'static str;

    /// Transcribe an image into an entity-tagged transcript
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript, TranscriptionError>;
}
