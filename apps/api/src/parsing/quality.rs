use tracing::warn;

use crate::parsing::contact::EMAIL;
use crate::parsing::{DocumentKind, ParseError};

/// Minimum trimmed length (in characters) for any recovered text.
pub const MIN_TEXT_CHARS: usize = 20;

/// Keywords that mark PDF output as resume prose rather than PDF internals.
const CV_KEYWORDS: &[&str] = &["experience", "education", "skills", "work", "job", "company"];

/// Rejects text that is too short to be a CV, and for PDF sources, text that
/// looks like object dictionaries or compressed-stream remnants.
///
/// PDF text passes when ANY of these hold:
/// - an email-shaped token is present
/// - more than 5 words longer than 2 characters
/// - one of [`CV_KEYWORDS`] appears (case-insensitive)
pub fn validate(text: &str, kind: DocumentKind) -> Result<(), ParseError> {
    let trimmed = text.trim();
    let length = trimmed.chars().count();

    if length < MIN_TEXT_CHARS {
        warn!(kind = %kind, length, "Recovered text below minimum length");
        return Err(ParseError::InsufficientText(format!(
            "recovered {length} characters, need at least {MIN_TEXT_CHARS}"
        )));
    }

    if kind == DocumentKind::Pdf && !looks_like_cv_text(trimmed) {
        warn!(length, "PDF text failed plausibility check");
        return Err(ParseError::InsufficientText(
            "PDF text does not look like resume content".to_string(),
        ));
    }

    Ok(())
}

fn looks_like_cv_text(text: &str) -> bool {
    if EMAIL.is_match(text) {
        return true;
    }

    let long_words = text
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .count();
    if long_words > 5 {
        return true;
    }

    let lower = text.to_lowercase();
    CV_KEYWORDS.iter().any(|k| lower.contains(k))
}
