// CV ingestion pipeline.
// bytes + declared kind → decoder → quality gate → contact info → sections → field extractors → record.
// Everything after the bytes are in memory is synchronous and holds no state between calls.

pub mod assembler;
pub mod contact;
pub mod decoder;
pub mod fields;
pub mod handlers;
pub mod kind;
pub mod pdf;
pub mod pipeline;
pub mod quality;
pub mod sections;

use thiserror::Error;

pub use kind::DocumentKind;
pub use pipeline::{CvParser, ParseOutcome};

/// Terminal pipeline failures. None of these are retried: the parse is
/// deterministic, so the same bytes would fail the same way.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported document type (media type: {media_type:?}, filename: {filename:?})")]
    UnsupportedKind {
        media_type: Option<String>,
        filename: Option<String>,
    },

    #[error("failed to extract text from {kind} document: {reason}")]
    ExtractionFailed { kind: DocumentKind, reason: String },

    #[error("insufficient text: {0}")]
    InsufficientText(String),
}
