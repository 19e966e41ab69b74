// Database models - Re-exports all domain-specific models
//
// This module is split into focused files by domain:
// - project.rs: Projects grouping documents
// - document.rs: Uploaded document images and their transcripts
// - annotation.rs: Per-token entity annotation records

mod project;
mod document;
mod annotation;

pub use project::{Project, ProjectUpdate, ProjectWithCount, ProjectWithDocuments};
pub use document::{Document, DocumentWithAnnotations};
pub use annotation::{Annotation, AnnotationUpdate};
