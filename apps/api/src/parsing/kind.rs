use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parsing::ParseError;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TXT_MEDIA_TYPE: &str = "text/plain";

/// The decoding strategy chosen for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Resolves the kind from the caller's hints. A recognised media type wins;
    /// otherwise the filename suffix decides.
    pub fn from_hints(media_type: Option<&str>, filename: Option<&str>) -> Result<Self, ParseError> {
        media_type
            .and_then(Self::from_media_type)
            .or_else(|| filename.and_then(Self::from_filename))
            .ok_or_else(|| ParseError::UnsupportedKind {
                media_type: media_type.map(String::from),
                filename: filename.map(String::from),
            })
    }

    pub fn from_media_type(media_type: &str) -> Option<Self> {
        // Drop parameters such as "; charset=utf-8"
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MEDIA_TYPE => Some(Self::Pdf),
            DOCX_MEDIA_TYPE => Some(Self::Docx),
            TXT_MEDIA_TYPE => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())?;
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
