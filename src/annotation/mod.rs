//! Token annotation core
//!
//! Converts between entity-tagged token sequences, the inline bracket-brace
//! markup users edit, character-level entity ranges, and the persisted
//! per-token annotation records.

pub mod codec;
pub mod projector;
pub mod reconciler;
pub mod token;

pub use codec::{decode, encode};
pub use projector::{project, raw_text, EntityRange, ExportPayload, Projection};
pub use reconciler::{reconcile, AnnotationOp, AnnotationRecord, ReconcileSummary};
pub use token::{normalize_class, EntityToken, Transcript};
