//! PDF text recovery without a PDF parser.
//!
//! The byte stream is mined by a ranked list of [`ExtractionTier`]s. A tier
//! only runs when every tier ranked above it produced fewer than
//! [`ADEQUATE_TIER_CHARS`] characters; the longest output among the tiers
//! that ran is kept, cleaned, and passed through the quality gate.
//!
//! ```text
//! bytes → operator-scoped (BT…ET) → paren scan → stream scan → clean → gate
//! ```

pub mod literal;
pub mod tiers;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::parsing::quality;
use crate::parsing::{DocumentKind, ParseError};

pub use tiers::{ExtractionTier, OperatorScopedTier, ParenScanTier, StreamScanTier, TierMiss};

/// Trimmed output length at which the tier cascade stops.
pub const ADEQUATE_TIER_CHARS: usize = 50;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub struct PdfTextExtractor {
    tiers: Vec<Box<dyn ExtractionTier>>,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::with_tiers(vec![
            Box::new(OperatorScopedTier),
            Box::new(ParenScanTier),
            Box::new(StreamScanTier),
        ])
    }
}

impl PdfTextExtractor {
    /// Builds an extractor that tries `tiers` in the given order.
    pub fn with_tiers(tiers: Vec<Box<dyn ExtractionTier>>) -> Self {
        Self { tiers }
    }

    pub fn extract(&self, data: &[u8]) -> Result<String, ParseError> {
        let text = clean_text(&self.best_candidate(data));
        quality::validate(&text, DocumentKind::Pdf)?;
        Ok(text)
    }

    fn best_candidate(&self, data: &[u8]) -> String {
        let mut best = String::new();
        let mut best_len = 0;

        for tier in &self.tiers {
            match tier.extract(data) {
                Ok(text) => {
                    let len = text.trim().chars().count();
                    debug!(tier = tier.name(), chars = len, "PDF tier produced text");
                    if len > best_len {
                        best_len = len;
                        best = text;
                    }
                    if len >= ADEQUATE_TIER_CHARS {
                        break;
                    }
                }
                Err(miss) => debug!(tier = tier.name(), reason = %miss, "PDF tier found nothing"),
            }
        }

        best
    }
}

/// Drops control characters (other than tab/newline/CR), collapses whitespace
/// runs to one space, and trims.
///
/// Newlines collapse too, so PDF text reaches contact and section extraction
/// as a single line: the name is the whole text and sections rarely open.
pub fn clean_text(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    WHITESPACE_RUN.replace_all(&printable, " ").trim().to_string()
}
