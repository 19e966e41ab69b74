//! Placeholder provider
//!
//! Used when no Hugging Face token is configured; never contacts a model.

use async_trait::async_trait;

use crate::annotation::token::placeholder_transcript;
use crate::annotation::Transcript;
use crate::transcription::provider::{TranscriptionError, TranscriptionProvider, TranscriptionRequest};

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderProvider;

#[async_trait]
impl TranscriptionProvider for PlaceholderProvider {
    fn provider_name(&self) -> &'static str {
        "placeholder"
    }

    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript, TranscriptionError> {
        log::debug!("Placeholder transcription for {}", request.image_path.display());
        Ok(placeholder_transcript())
    }
}
