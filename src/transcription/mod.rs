//! Transcription of document images into entity-tagged transcripts
//!
//! Providers call an external vision-language model; the service wraps a
//! provider with a timeout and an explicit fallback strategy.

pub mod provider;
pub mod providers;
pub mod service;

pub use provider::{TranscriptionError, TranscriptionProvider, TranscriptionRequest};
pub use providers::{GradioConfig, GradioProvider, PlaceholderProvider};
pub use service::{FallbackStrategy, TranscriptionOutcome, TranscriptionService};
