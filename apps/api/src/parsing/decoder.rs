use std::sync::Arc;

use tracing::{debug, warn};

use crate::parsing::pdf::PdfTextExtractor;
use crate::parsing::{DocumentKind, ParseError};

/// External rich-document reader: DOCX bytes in, raw text out.
///
/// Implementations are trusted to fail on corrupt input; the decoder wraps
/// any failure as [`ParseError::ExtractionFailed`]. Reading is CPU-bound and
/// runs on the blocking pool (see [`CvParser::spawn_parse`]).
///
/// [`CvParser::spawn_parse`]: crate::parsing::CvParser::spawn_parse
pub trait DocumentReader: Send + Sync {
    fn read_text(&self, bytes: &[u8]) -> anyhow::Result<String>;
}

/// `docx-rs` backed reader. One output line per non-empty body paragraph.
pub struct DocxReader;

impl DocumentReader for DocxReader {
    fn read_text(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let docx = docx_rs::read_docx(bytes).map_err(|e| anyhow::anyhow!("invalid DOCX: {e}"))?;

        let mut paragraphs: Vec<String> = Vec::new();
        for child in docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(para) = child {
                let text: String = para
                    .children
                    .iter()
                    .filter_map(|pc| match pc {
                        docx_rs::ParagraphChild::Run(run) => Some(
                            run.children
                                .iter()
                                .filter_map(|rc| match rc {
                                    docx_rs::RunChild::Text(t) => Some(t.text.as_str()),
                                    _ => None,
                                })
                                .collect::<String>(),
                        ),
                        _ => None,
                    })
                    .collect();

                if !text.trim().is_empty() {
                    paragraphs.push(text);
                }
            }
        }

        Ok(paragraphs.join("\n"))
    }
}

/// Turns uploaded bytes into plain text according to their declared kind.
#[derive(Clone)]
pub struct RawTextDecoder {
    docx_reader: Arc<dyn DocumentReader>,
    pdf: Arc<PdfTextExtractor>,
}

impl Default for RawTextDecoder {
    fn default() -> Self {
        Self::new(Arc::new(DocxReader))
    }
}

impl RawTextDecoder {
    pub fn new(docx_reader: Arc<dyn DocumentReader>) -> Self {
        Self {
            docx_reader,
            pdf: Arc::new(PdfTextExtractor::default()),
        }
    }

    pub fn decode(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ParseError> {
        debug!(kind = %kind, bytes = bytes.len(), "Decoding upload");
        match kind {
            DocumentKind::Docx => self.docx_reader.read_text(bytes).map_err(|e| {
                warn!("DOCX reader failed: {e}");
                ParseError::ExtractionFailed {
                    kind,
                    reason: e.to_string(),
                }
            }),
            DocumentKind::Txt => Ok(decode_plain_text(bytes)),
            DocumentKind::Pdf => self.pdf.extract(bytes),
        }
    }
}

/// UTF-8 decode with a lossy fallback; a leading BOM is dropped.
fn decode_plain_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
