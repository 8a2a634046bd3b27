use crate::models::cv::{ParsedRecord, SUMMARY_MAX_CHARS};
use crate::parsing::contact::ContactInfo;
use crate::parsing::fields::SectionContent;
use crate::parsing::sections::SectionTag;

/// Merges contact info and section outputs into one record.
/// When a section appears more than once, the last flush wins.
pub fn assemble(contact: ContactInfo, sections: Vec<(SectionTag, SectionContent)>) -> ParsedRecord {
    let mut record = ParsedRecord {
        personal_info: contact.into(),
        ..ParsedRecord::default()
    };

    for (_, content) in sections {
        match content {
            SectionContent::Summary(text) => record.summary = truncate_chars(&text, SUMMARY_MAX_CHARS),
            SectionContent::Experience(entries) => record.experience = entries,
            SectionContent::Education(entries) => record.education = entries,
            SectionContent::Skills(entries) => record.skills = entries,
            SectionContent::Languages(entries) => record.languages = entries,
        }
    }

    record
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
