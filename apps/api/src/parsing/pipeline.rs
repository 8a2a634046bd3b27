use bytes::Bytes;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::models::cv::ParsedRecord;
use crate::parsing::decoder::RawTextDecoder;
use crate::parsing::sections::{segment, SectionTag};
use crate::parsing::{assembler, contact, quality, DocumentKind, ParseError};

/// A parsed record plus what the pipeline observed on the way.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    pub record: ParsedRecord,
    pub kind: DocumentKind,
    pub text_length: usize,
    pub sections: Vec<SectionTag>,
}

/// Entry point for parsing uploads. Holds no per-call state, so one instance
/// serves any number of concurrent requests.
#[derive(Clone, Default)]
pub struct CvParser {
    decoder: RawTextDecoder,
}

impl CvParser {
    pub fn new(decoder: RawTextDecoder) -> Self {
        Self { decoder }
    }

    pub fn parse(
        &self,
        bytes: &[u8],
        media_type: Option<&str>,
        filename: Option<&str>,
    ) -> Result<ParseOutcome, ParseError> {
        let kind = DocumentKind::from_hints(media_type, filename)?;
        let text = self.decoder.decode(bytes, kind)?;
        parse_decoded(&text, kind)
    }

    /// Runs [`parse`](Self::parse) on the blocking pool. Decoding is CPU-bound
    /// and must not hold an executor thread, or a timeout around it never fires.
    pub fn spawn_parse(
        &self,
        bytes: Bytes,
        media_type: Option<String>,
        filename: Option<String>,
    ) -> JoinHandle<Result<ParseOutcome, ParseError>> {
        let parser = self.clone();
        tokio::task::spawn_blocking(move || {
            parser.parse(&bytes, media_type.as_deref(), filename.as_deref())
        })
    }
}

/// Runs the text half of the pipeline: quality gate, contact info, sections.
pub fn parse_decoded(text: &str, kind: DocumentKind) -> Result<ParseOutcome, ParseError> {
    quality::validate(text, kind)?;

    let contact = contact::extract(text.lines());
    let sections = segment(text);
    let text_length = text.chars().count();
    let tags: Vec<SectionTag> = sections.iter().map(|(tag, _)| *tag).collect();
    let record = assembler::assemble(contact, sections);

    info!(
        kind = %kind,
        text_length,
        experience = record.experience.len(),
        education = record.education.len(),
        skills = record.skills.len(),
        languages = record.languages.len(),
        "Parsed CV"
    );

    Ok(ParseOutcome {
        record,
        kind,
        text_length,
        sections: tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::Proficiency;

    const JANE_DOE: &str = "Jane Doe
jane.doe@example.com | +230 5123 4567
linkedin.com/in/janedoe
Experience
Senior Developer - Acme Corp
2020 - present
• Led migration of core services
Education
BSc Computer Science, University of Mauritius
2016
Skills
TypeScript, Project Management, Leadership";

    /// Record with ids blanked so two parses can be compared field by field.
    fn without_ids(mut record: ParsedRecord) -> ParsedRecord {
        let nil = uuid::Uuid::nil();
        record.experience.iter_mut().for_each(|e| e.id = nil);
        record.education.iter_mut().for_each(|e| e.id = nil);
        record.skills.iter_mut().for_each(|e| e.id = nil);
        record.languages.iter_mut().for_each(|e| e.id = nil);
        record
    }

    #[test]
    fn test_end_to_end_plain_text() {
        let outcome = CvParser::default()
            .parse(JANE_DOE.as_bytes(), Some("text/plain"), Some("jane.txt"))
            .unwrap();
        let record = outcome.record;

        assert_eq!(record.personal_info.full_name, "Jane Doe");
        assert_eq!(record.personal_info.email, "jane.doe@example.com");
        assert_eq!(record.personal_info.phone, "+230 5123 4567");
        assert_eq!(record.personal_info.profile_url, "linkedin.com/in/janedoe");
        assert_eq!(record.personal_info.homepage, "");

        assert_eq!(record.experience.len(), 1);
        let job = &record.experience[0];
        assert_eq!(job.role, "Senior Developer");
        assert_eq!(job.company, "Acme Corp");
        assert!(job.current);
        assert_eq!(job.end_date, "");
        assert!(job.description.contains("• Led migration of core services"));

        assert_eq!(record.education.len(), 1);
        assert_eq!(record.education[0].year, "2016");

        let skills: Vec<_> = record.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skills, vec!["TypeScript", "Project Management", "Leadership"]);

        assert!(record.languages.is_empty());
        assert_eq!(
            outcome.sections,
            vec![SectionTag::Experience, SectionTag::Education, SectionTag::Skills]
        );
        assert_eq!(outcome.kind, DocumentKind::Txt);
    }

    #[test]
    fn test_parse_is_idempotent_apart_from_ids() {
        let parser = CvParser::default();
        let first = parser.parse(JANE_DOE.as_bytes(), None, Some("cv.txt")).unwrap();
        let second = parser.parse(JANE_DOE.as_bytes(), None, Some("cv.txt")).unwrap();

        assert_ne!(first.record.skills[0].id, second.record.skills[0].id);
        assert_eq!(without_ids(first.record), without_ids(second.record));
    }

    #[test]
    fn test_ids_unique_within_record() {
        let outcome = CvParser::default()
            .parse(JANE_DOE.as_bytes(), None, Some("cv.txt"))
            .unwrap();
        let record = outcome.record;
        let mut ids: Vec<_> = record
            .experience
            .iter()
            .map(|e| e.id)
            .chain(record.education.iter().map(|e| e.id))
            .chain(record.skills.iter().map(|e| e.id))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_short_text_insufficient_for_any_kind() {
        let parser = CvParser::default();
        for filename in ["a.txt", "a.pdf"] {
            let err = parser.parse(b"Jane Doe", None, Some(filename)).unwrap_err();
            assert!(matches!(err, ParseError::InsufficientText(_)), "{filename}");
        }
    }

    #[test]
    fn test_unsupported_kind() {
        let err = CvParser::default()
            .parse(b"GIF89a", Some("image/gif"), Some("me.gif"))
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedKind { .. }));
    }

    /// Content-stream text is flattened to one line, so the whole document
    /// reads as the name and no header is short enough to open a section.
    #[test]
    fn test_pdf_text_is_a_single_line() {
        const PDF_RESUME: &[u8] = b"%PDF-1.4
1 0 obj
<< /Length 120 >>
stream
BT
(Jane Doe) Tj
(jane.doe@example.com) Tj
(Experience) Tj
(Senior Developer - Acme Corp) Tj
ET
endstream
endobj
%%EOF";
        let outcome = CvParser::default()
            .parse(PDF_RESUME, Some("application/pdf"), Some("jane.pdf"))
            .unwrap();
        let record = outcome.record;

        assert_eq!(
            record.personal_info.full_name,
            "Jane Doe jane.doe@example.com Experience Senior Developer - Acme Corp"
        );
        assert_eq!(record.personal_info.email, "jane.doe@example.com");
        assert!(outcome.sections.is_empty());
        assert!(record.experience.is_empty());
    }

    #[test]
    fn test_unterminated_pdf_literals_fail_fast() {
        let mut data = b"%PDF-1.4\n".to_vec();
        data.extend(std::iter::repeat(b'(').take(4 * 1024 * 1024));

        let started = std::time::Instant::now();
        let err = CvParser::default().parse(&data, None, Some("broken.pdf")).unwrap_err();
        assert!(matches!(err, ParseError::InsufficientText(_)));
        assert!(
            started.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_spawn_parse_runs_off_the_executor() {
        let outcome = CvParser::default()
            .spawn_parse(Bytes::from_static(JANE_DOE.as_bytes()), None, Some("cv.txt".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.record.personal_info.full_name, "Jane Doe");
        assert_eq!(outcome.text_length, JANE_DOE.chars().count());
    }

    #[test]
    fn test_no_sections_is_still_success() {
        let outcome = parse_decoded(
            "Jane Doe\njane@example.com\nLikes long walks on the beach",
            DocumentKind::Txt,
        )
        .unwrap();
        assert_eq!(outcome.record.personal_info.email, "jane@example.com");
        assert!(outcome.sections.is_empty());
        assert!(outcome.record.skills.is_empty());
    }

    #[test]
    fn test_summary_and_languages_sections() {
        let text = "John Smith\nProfile\nPlatform engineer focused on reliability.\nLanguages\nEnglish - Fluent\nSpanish (basic)";
        let record = parse_decoded(text, DocumentKind::Txt).unwrap().record;
        assert_eq!(record.summary, "Platform engineer focused on reliability.");
        assert_eq!(record.languages.len(), 2);
        assert_eq!(record.languages[1].proficiency, Proficiency::Basic);
    }
}
