//! HTTP JSON API
//!
//! axum router over projects, documents, annotations, transcription and
//! export. Every handler receives the shared [`AppState`](crate::state::AppState).

pub mod error;
pub mod handlers;
pub mod router;

pub use error::ApiError;
pub use router::build_router;
