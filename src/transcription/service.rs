//! Transcription service
//!
//! Wraps the active provider with a hard timeout and a fallback strategy.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::annotation::token::placeholder_transcript;
use crate::annotation::Transcript;
use crate::config::AppConfig;
use crate::perf_debug;
use crate::transcription::provider::{TranscriptionError, TranscriptionProvider, TranscriptionRequest};
use crate::transcription::providers::{GradioProvider, PlaceholderProvider};

/// What to do when the provider fails or times out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackStrategy {
    /// Store the placeholder transcript and report success
    Placeholder,
    /// Propagate the error to the caller
    Fail,
}

impl FromStr for FallbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "placeholder" => Ok(Self::Placeholder),
            "fail" => Ok(Self::Fail),
            other => Err(format!("Unknown fallback strategy: {}", other)),
        }
    }
}

/// Result of one transcription call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionOutcome {
    pub transcript: Transcript,
    pub fallback_used: bool,
    pub provider: &'static str,
}

pub struct TranscriptionService {
    provider: Arc<dyn TranscriptionProvider>,
    timeout: Duration,
    fallback: FallbackStrategy,
}

impl TranscriptionService {
    pub fn new(provider: Arc<dyn TranscriptionProvider>, timeout: Duration, fallback: FallbackStrategy) -> Self {
        Self {
            provider,
            timeout,
            fallback,
        }
    }

    /// Pick the Gradio provider when a token is configured, else the placeholder
    pub fn from_config(config: &AppConfig) -> Result<Self, TranscriptionError> {
        let provider: Arc<dyn TranscriptionProvider> = if config.hf_token.is_some() {
            log::info!("Using Gradio transcription provider at {}", config.gradio_url);
            Arc::new(GradioProvider::new(config.gradio_config())?)
        } else {
            log::warn!("HF_TOKEN not set, transcription will return placeholder text");
            Arc::new(PlaceholderProvider)
        };

        Ok(Self::new(provider, config.transcribe_timeout, config.fallback))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn transcribe(&self, request: &TranscriptionRequest) -> Result<TranscriptionOutcome, TranscriptionError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.provider.transcribe(request)).await {
            Ok(result) => result,
            Err(_) => Err(TranscriptionError::Timeout(self.timeout)),
        };
        perf_debug!(
            "Transcription via {} took {:?}",
            self.provider.provider_name(),
            started.elapsed()
        );

        match result {
            Ok(transcript) => Ok(TranscriptionOutcome {
                transcript,
                fallback_used: false,
                provider: self.provider.provider_name(),
            }),
            Err(e) => match self.fallback {
                FallbackStrategy::Placeholder => {
                    log::warn!(
                        "Transcription of {} failed, using placeholder: {}",
                        request.image_path.display(),
                        e
                    );
                    Ok(TranscriptionOutcome {
                        transcript: placeholder_transcript(),
                        fallback_used: true,
                        provider: self.provider.provider_name(),
                    })
                }
                FallbackStrategy::Fail => {
                    log::error!("Transcription of {} failed: {}", request.image_path.display(), e);
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::token::PLACEHOLDER_TEXT;
    use crate::annotation::EntityToken;
    use async_trait::async_trait;

    struct FailingProvider;

    #[async_trait]
    impl TranscriptionProvider for FailingProvider {
        fn provider_name(&self) -> &'static str {
            "failing"
        }

        async fn transcribe(&self, _request: &TranscriptionRequest) -> Result<Transcript, TranscriptionError> {
            Err(TranscriptionError::RequestFailed("boom".to_string()))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl TranscriptionProvider for SlowProvider {
        fn provider_name(&self) -> &'static str {
            "slow"
        }

        async fn transcribe(&self, _request: &TranscriptionRequest) -> Result<Transcript, TranscriptionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![EntityToken::plain("late")])
        }
    }

    struct FixedProvider;

    #[async_trait]
    impl TranscriptionProvider for FixedProvider {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn transcribe(&self, _request: &TranscriptionRequest) -> Result<Transcript, TranscriptionError> {
            Ok(vec![EntityToken::tagged("Bob", "person")])
        }
    }

    fn request() -> TranscriptionRequest {
        TranscriptionRequest {
            image_path: "scan.png".into(),
            labels: "person".to_string(),
            model: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let service = TranscriptionService::new(Arc::new(FixedProvider), Duration::from_secs(1), FallbackStrategy::Fail);
        let outcome = service.transcribe(&request()).await.unwrap();
        assert!(!outcome.fallback_used);
        assert_eq!(outcome.provider, "fixed");
        assert_eq!(outcome.transcript, vec![EntityToken::tagged("Bob", "person")]);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_placeholder() {
        let service = TranscriptionService::new(
            Arc::new(FailingProvider),
            Duration::from_secs(1),
            FallbackStrategy::Placeholder,
        );
        let outcome = service.transcribe(&request()).await.unwrap();
        assert!(outcome.fallback_used);
        assert_eq!(outcome.transcript[0].text, PLACEHOLDER_TEXT);
    }

    #[tokio::test]
    async fn test_failure_propagates_with_fail_strategy() {
        let service = TranscriptionService::new(Arc::new(FailingProvider), Duration::from_secs(1), FallbackStrategy::Fail);
        assert!(matches!(
            service.transcribe(&request()).await,
            Err(TranscriptionError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let service = TranscriptionService::new(Arc::new(SlowProvider), Duration::from_millis(20), FallbackStrategy::Fail);
        assert!(matches!(
            service.transcribe(&request()).await,
            Err(TranscriptionError::Timeout(_))
        ));

        let service = TranscriptionService::new(
            Arc::new(SlowProvider),
            Duration::from_millis(20),
            FallbackStrategy::Placeholder,
        );
        assert!(service.transcribe(&request()).await.unwrap().fallback_used);
    }

    #[test]
    fn test_fallback_strategy_parse() {
        assert_eq!("placeholder".parse::<FallbackStrategy>().unwrap(), FallbackStrategy::Placeholder);
        assert_eq!(" FAIL ".parse::<FallbackStrategy>().unwrap(), FallbackStrategy::Fail);
        assert!("retry".parse::<FallbackStrategy>().is_err());
    }

    #[test]
    fn test_from_config_without_token_uses_placeholder() {
        let config = AppConfig::for_data_dir(std::path::Path::new("/tmp"));
        let service = TranscriptionService::from_config(&config).unwrap();
        assert_eq!(service.provider_name(), "placeholder");
    }
}
