//! Transcription provider implementations

pub mod gradio_provider;
pub mod placeholder_provider;

pub use gradio_provider::{GradioConfig, GradioProvider};
pub use placeholder_provider::PlaceholderProvider;
