use serde::{Deserialize, Serialize};

use crate::parsing::fields::{extract_section, SectionContent};

/// A keyword line is only a header when it is shorter than this.
///
/// Known false positive: short prose such as "My work experience began in 2015"
/// still opens a section. The threshold is kept as-is for compatibility.
pub const MAX_HEADER_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    Summary,
    Experience,
    Education,
    Skills,
    Languages,
}

impl SectionTag {
    /// Checked in this order; the first tag with a matching keyword wins.
    pub const ALL: [SectionTag; 5] = [
        SectionTag::Summary,
        SectionTag::Experience,
        SectionTag::Education,
        SectionTag::Skills,
        SectionTag::Languages,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            SectionTag::Summary => &["summary", "profile", "objective", "about me"],
            SectionTag::Experience => &["experience", "employment", "work history", "career"],
            SectionTag::Education => &["education", "academic", "qualification"],
            SectionTag::Skills => &["skills", "competencies", "expertise", "technologies"],
            SectionTag::Languages => &["language"],
        }
    }
}

/// Returns the section a line opens, if it reads as a header.
pub fn detect_header(line: &str) -> Option<SectionTag> {
    if line.chars().count() >= MAX_HEADER_CHARS {
        return None;
    }
    let lower = line.to_lowercase();
    SectionTag::ALL
        .into_iter()
        .find(|tag| tag.keywords().iter().any(|k| lower.contains(k)))
}

#[derive(Debug)]
enum State {
    NoSection,
    InSection { tag: SectionTag, buffer: Vec<String> },
}

/// Line-at-a-time state machine. Lines before the first header are dropped;
/// each header flushes the open buffer to that section's extractor.
#[derive(Debug)]
pub struct SectionSegmenter {
    state: State,
    flushed: Vec<(SectionTag, SectionContent)>,
}

impl Default for SectionSegmenter {
    fn default() -> Self {
        Self {
            state: State::NoSection,
            flushed: Vec::new(),
        }
    }
}

impl SectionSegmenter {
    pub fn feed(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(tag) = detect_header(line) {
            self.flush();
            self.state = State::InSection {
                tag,
                buffer: Vec::new(),
            };
            return;
        }

        if let State::InSection { buffer, .. } = &mut self.state {
            buffer.push(line.to_string());
        }
    }

    /// Flushes the final buffer and returns every section in encounter order.
    pub fn finish(mut self) -> Vec<(SectionTag, SectionContent)> {
        self.flush();
        self.flushed
    }

    fn flush(&mut self) {
        if let State::InSection { tag, buffer } = std::mem::replace(&mut self.state, State::NoSection) {
            if !buffer.is_empty() {
                self.flushed.push((tag, extract_section(tag, &buffer)));
            }
        }
    }
}

pub fn segment(text: &str) -> Vec<(SectionTag, SectionContent)> {
    let mut segmenter = SectionSegmenter::default();
    for line in text.lines() {
        segmenter.feed(line);
    }
    segmenter.finish()
}
