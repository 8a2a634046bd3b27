use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::literal::{decode_literal, is_token_at, is_whitespace, lenient_decode, scan_array, scan_literal};

/// Why a tier produced no text at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierMiss {
    #[error("no BT/ET text objects")]
    NoTextObjects,

    #[error("text objects contain no Tj/TJ strings")]
    NoShowOperators,

    #[error("no literal strings survived filtering")]
    NoLiterals,

    #[error("no readable runs inside streams")]
    NoStreamText,
}

/// One text-recovery strategy over raw PDF bytes.
///
/// `PdfTextExtractor` runs tiers in rank order, so a tier may assume the ones
/// ranked before it came up short.
pub trait ExtractionTier: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, data: &[u8]) -> Result<String, TierMiss>;
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 1: strings shown by Tj / TJ inside BT … ET
// ────────────────────────────────────────────────────────────────────────────

pub struct OperatorScopedTier;

impl ExtractionTier for OperatorScopedTier {
    fn name(&self) -> &'static str {
        "operator-scoped"
    }

    fn extract(&self, data: &[u8]) -> Result<String, TierMiss> {
        let mut found_text_object = false;
        let mut shown = Vec::new();

        let mut i = 0;
        while i < data.len() {
            if is_token_at(data, i, b"BT") {
                found_text_object = true;
                i = scan_text_object(data, i + 2, &mut shown);
            } else {
                i += 1;
            }
        }

        if !found_text_object {
            return Err(TierMiss::NoTextObjects);
        }
        if shown.is_empty() {
            return Err(TierMiss::NoShowOperators);
        }
        Ok(shown.join(" "))
    }
}

/// Collects shown strings until the matching `ET`; returns the index after it.
fn scan_text_object(data: &[u8], start: usize, shown: &mut Vec<String>) -> usize {
    // Operand waiting for its operator. Anything else in between discards it.
    let mut pending: Option<String> = None;
    let mut i = start;

    while i < data.len() {
        let b = data[i];
        if is_whitespace(b) {
            i += 1;
        } else if b == b'(' {
            match scan_literal(data, i) {
                Ok((raw, next)) => {
                    pending = Some(decode_literal(raw));
                    i = next;
                }
                Err(stop) => {
                    pending = None;
                    i = stop;
                }
            }
        } else if b == b'[' {
            match scan_array(data, i) {
                Ok((text, next)) => {
                    pending = Some(text);
                    i = next;
                }
                Err(stop) => {
                    pending = None;
                    i = stop;
                }
            }
        } else if is_token_at(data, i, b"Tj") || is_token_at(data, i, b"TJ") {
            if let Some(text) = pending.take() {
                if !text.trim().is_empty() {
                    shown.push(text);
                }
            }
            i += 2;
        } else if is_token_at(data, i, b"ET") {
            return i + 2;
        } else {
            pending = None;
            i += 1;
        }
    }
    data.len()
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 2: any plausible (literal) anywhere in the file
// ────────────────────────────────────────────────────────────────────────────

const STRUCTURAL_KEYWORDS: &[&str] = &["endobj", "stream", "FlateDecode"];

pub struct ParenScanTier;

impl ExtractionTier for ParenScanTier {
    fn name(&self) -> &'static str {
        "paren-scan"
    }

    fn extract(&self, data: &[u8]) -> Result<String, TierMiss> {
        let mut kept = Vec::new();
        let mut i = 0;
        while i < data.len() {
            if data[i] != b'(' {
                i += 1;
                continue;
            }
            match scan_literal(data, i) {
                Ok((raw, next)) => {
                    let text = decode_literal(raw);
                    if is_plausible_literal(&text) {
                        kept.push(text.trim().to_string());
                    }
                    i = next;
                }
                // Parens inside an unterminated run are not retried
                Err(stop) => i = stop,
            }
        }

        if kept.is_empty() {
            Err(TierMiss::NoLiterals)
        } else {
            Ok(kept.join(" "))
        }
    }
}

fn is_plausible_literal(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() <= 2 {
        return false;
    }
    if !trimmed.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return false;
    }
    !STRUCTURAL_KEYWORDS.iter().any(|k| trimmed.contains(k))
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 3: readable runs inside stream … endstream
// ────────────────────────────────────────────────────────────────────────────

static STREAM_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)stream(.*?)endstream").unwrap());
static READABLE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9\s@.,\-_]{3,}").unwrap());

pub struct StreamScanTier;

impl ExtractionTier for StreamScanTier {
    fn name(&self) -> &'static str {
        "stream-scan"
    }

    fn extract(&self, data: &[u8]) -> Result<String, TierMiss> {
        let content = lenient_decode(data);
        let runs: Vec<&str> = STREAM_BODY
            .captures_iter(&content)
            .filter_map(|caps| caps.get(1))
            .flat_map(|body| READABLE_RUN.find_iter(body.as_str()))
            .map(|m| m.as_str().trim())
            .filter(|run| !run.is_empty() && !run.contains("obj"))
            .collect();

        if runs.is_empty() {
            Err(TierMiss::NoStreamText)
        } else {
            Ok(runs.join(" "))
        }
    }
}
