//! Per-section heuristics that turn a section's lines into typed entries.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::cv::{EducationEntry, ExperienceEntry, LanguageEntry, Proficiency, SkillEntry};
use crate::parsing::sections::SectionTag;

const BULLETS: &[char] = &['•', '-', '*'];

static YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{4})\s*[-–]\s*(\d{4}|present|current)").unwrap());
static AT_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bat\s").unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());
static GPA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bgpa\b[:\s]*([0-4](?:\.\d{1,2})?)").unwrap());
static SKILL_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,•·\n]").unwrap());
static LANGUAGE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\-(]").unwrap());

/// What one section flush produced. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Summary(String),
    Experience(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Skills(Vec<SkillEntry>),
    Languages(Vec<LanguageEntry>),
}

pub fn extract_section(tag: SectionTag, lines: &[String]) -> SectionContent {
    match tag {
        SectionTag::Summary => SectionContent::Summary(summary(lines)),
        SectionTag::Experience => SectionContent::Experience(experience(lines)),
        SectionTag::Education => SectionContent::Education(education(lines)),
        SectionTag::Skills => SectionContent::Skills(skills(lines)),
        SectionTag::Languages => SectionContent::Languages(languages(lines)),
    }
}

/// Summary lines joined with single spaces. Truncation happens at assembly.
pub fn summary(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

/// Classifies each line as bullet, date range, or job header.
///
/// Bullets are checked first, then date ranges, so "2020 - present" and
/// "- Shipped X" are never mistaken for headers. A date line whose remainder
/// is itself a header ("Engineer at Foo (2018 - 2020)") opens the new entry
/// and dates it.
pub fn experience(lines: &[String]) -> Vec<ExperienceEntry> {
    let mut entries = Vec::new();
    let mut in_progress: Option<ExperienceEntry> = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(BULLETS) {
            if let Some(entry) = in_progress.as_mut() {
                entry.description.push_str(line);
                entry.description.push('\n');
            }
            continue;
        }

        if let Some(caps) = YEAR_RANGE.captures(line) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
            let remainder = format!("{}{}", &line[..whole.start], &line[whole.end..]);
            let remainder = remainder.trim_matches(|c: char| c.is_whitespace() || "|-,()".contains(c));

            if is_job_header(remainder) {
                finalize(&mut entries, in_progress.take());
                in_progress = Some(entry_from_header(remainder));
            }
            if let Some(entry) = in_progress.as_mut() {
                apply_dates(entry, &caps[1], &caps[2]);
            }
            continue;
        }

        if is_job_header(line) {
            finalize(&mut entries, in_progress.take());
            in_progress = Some(entry_from_header(line));
        }
    }

    finalize(&mut entries, in_progress);
    entries
}

fn is_job_header(line: &str) -> bool {
    line.contains('|') || line.contains('-') || AT_TOKEN.is_match(line)
}

fn entry_from_header(line: &str) -> ExperienceEntry {
    let (role, company) = split_header(line);
    ExperienceEntry {
        role,
        company,
        ..ExperienceEntry::new()
    }
}

/// Splits a header into (role, company). `|` is preferred over `at`, and a
/// spaced dash over a bare one, so hyphenated titles survive when possible.
fn split_header(line: &str) -> (String, String) {
    let parts: Vec<&str> = if line.contains('|') {
        line.split('|').collect()
    } else if let Some(m) = AT_TOKEN.find(line) {
        vec![&line[..m.start()], &line[m.end()..]]
    } else if line.contains(" - ") {
        line.splitn(2, " - ").collect()
    } else {
        line.splitn(2, '-').collect()
    };

    let role = parts.first().map(|s| s.trim()).unwrap_or_default();
    let company = parts.get(1).map(|s| s.trim()).unwrap_or_default();
    (role.to_string(), company.to_string())
}

fn apply_dates(entry: &mut ExperienceEntry, start: &str, end: &str) {
    entry.start_date = start.to_string();
    let end_lower = end.to_lowercase();
    if end_lower == "present" || end_lower == "current" {
        entry.current = true;
        entry.end_date.clear();
    } else {
        entry.current = false;
        entry.end_date = end.to_string();
    }
}

fn finalize(entries: &mut Vec<ExperienceEntry>, entry: Option<ExperienceEntry>) {
    if let Some(entry) = entry {
        if !entry.role.is_empty() {
            entries.push(entry);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

/// Lines over 10 characters with real words become entries: degree, then
/// institution, split on `,` and `|`. Shorter or word-free lines only supply
/// a year or GPA to the latest entry that lacks one.
pub fn education(lines: &[String]) -> Vec<EducationEntry> {
    let mut entries: Vec<EducationEntry> = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let year = YEAR
            .captures_iter(line)
            .last()
            .map(|caps| caps[1].to_string());
        let gpa_match = GPA.captures(line);
        let gpa = gpa_match.as_ref().map(|caps| caps[1].to_string());
        let without_gpa = match gpa_match.as_ref().and_then(|caps| caps.get(0)) {
            Some(m) => format!("{}{}", &line[..m.start()], &line[m.end()..]),
            None => line.to_string(),
        };
        let has_words = without_gpa.chars().any(char::is_alphabetic);

        if line.chars().count() > 10 && has_words {
            let segments: Vec<&str> = without_gpa
                .split(',')
                .flat_map(|s| s.split('|'))
                .map(str::trim)
                .filter(|s| s.chars().any(char::is_alphabetic))
                .collect();

            entries.push(EducationEntry {
                id: Uuid::new_v4(),
                degree: segments.first().map(|s| s.to_string()).unwrap_or_default(),
                institution: segments.get(1).map(|s| s.to_string()).unwrap_or_default(),
                year: year.unwrap_or_default(),
                gpa,
            });
        } else if let Some(last) = entries.last_mut() {
            if last.year.is_empty() {
                if let Some(year) = year {
                    last.year = year;
                }
            }
            if last.gpa.is_none() {
                last.gpa = gpa;
            }
        }
    }

    entries
}

// ────────────────────────────────────────────────────────────────────────────
// Skills & languages
// ────────────────────────────────────────────────────────────────────────────

pub fn skills(lines: &[String]) -> Vec<SkillEntry> {
    let joined = lines.join("\n");
    SKILL_SEPARATOR
        .split(&joined)
        .map(|token| token.trim().trim_start_matches(['-', '*']).trim())
        .filter(|token| (2..50).contains(&token.chars().count()))
        .map(SkillEntry::new)
        .collect()
}

pub fn languages(lines: &[String]) -> Vec<LanguageEntry> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches(BULLETS).trim_start();
            let name = LANGUAGE_SEPARATOR.split(line).next()?.trim();
            if name.is_empty() {
                return None;
            }
            let lower = line.to_lowercase();
            let proficiency = if lower.contains("fluent") {
                Proficiency::Fluent
            } else if lower.contains("basic") {
                Proficiency::Basic
            } else {
                Proficiency::Intermediate
            };
            Some(LanguageEntry {
                id: Uuid::new_v4(),
                name: name.to_string(),
                proficiency,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_experience_header_dates_and_bullets() {
        let entries = experience(&lines(&[
            "Senior Developer - Acme Corp",
            "2020 - present",
            "• Led migration of core services",
            "• Mentored four engineers",
        ]));
        assert_eq!(entries.len(), 1);
        let job = &entries[0];
        assert_eq!(job.role, "Senior Developer");
        assert_eq!(job.company, "Acme Corp");
        assert_eq!(job.start_date, "2020");
        assert_eq!(job.end_date, "");
        assert!(job.current);
        assert_eq!(
            job.description,
            "• Led migration of core services\n• Mentored four engineers\n"
        );
    }

    #[test]
    fn test_experience_multiple_jobs_keep_order() {
        let entries = experience(&lines(&[
            "Backend Engineer | Globex",
            "2018 - 2020",
            "Intern at Initech",
            "2017 - 2018",
        ]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].company, "Globex");
        assert_eq!(entries[0].end_date, "2020");
        assert!(!entries[0].current);
        assert_eq!(entries[1].role, "Intern");
        assert_eq!(entries[1].company, "Initech");
        assert_eq!(entries[1].start_date, "2017");
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn test_experience_header_with_inline_dates() {
        let entries = experience(&lines(&["Data Engineer at Hooli (2015 - Current)"]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, "Data Engineer");
        assert_eq!(entries[0].company, "Hooli");
        assert_eq!(entries[0].start_date, "2015");
        assert!(entries[0].current);
    }

    #[test]
    fn test_experience_ignores_orphan_lines() {
        let entries = experience(&lines(&["• bullet before any job", "2019 - 2020", "plain prose"]));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_experience_hyphenated_title() {
        let entries = experience(&lines(&["Full-Stack Developer - Umbrella"]));
        assert_eq!(entries[0].role, "Full-Stack Developer");
        assert_eq!(entries[0].company, "Umbrella");
    }

    #[test]
    fn test_education_entry_with_trailing_year_line() {
        let entries = education(&lines(&["BSc Computer Science, University of Mauritius", "2016"]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].degree, "BSc Computer Science");
        assert_eq!(entries[0].institution, "University of Mauritius");
        assert_eq!(entries[0].year, "2016");
        assert!(entries[0].gpa.is_none());
    }

    #[test]
    fn test_education_pipe_separator_and_inline_year() {
        let entries = education(&lines(&["MSc Data Science | ETH Zurich | 2019", "GPA: 3.8"]));
        assert_eq!(entries[0].degree, "MSc Data Science");
        assert_eq!(entries[0].institution, "ETH Zurich");
        assert_eq!(entries[0].year, "2019");
        assert_eq!(entries[0].gpa.as_deref(), Some("3.8"));
    }

    #[test]
    fn test_education_date_range_line_sets_year() {
        let entries = education(&lines(&["High School Diploma", "2010 - 2014"]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].institution, "");
        assert_eq!(entries[0].year, "2014");
    }

    #[test]
    fn test_skills_split_and_filtered() {
        let result = skills(&lines(&[
            "TypeScript, Project Management, Leadership",
            "• Rust • Go",
            "C",
        ]));
        let names: Vec<_> = result.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["TypeScript", "Project Management", "Leadership", "Rust", "Go"]
        );
        assert!(result.iter().all(|s| s.level == 3));
    }

    #[test]
    fn test_skills_drop_overlong_tokens() {
        let long = "x".repeat(50);
        let result = skills(&[long, "SQL".to_string()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "SQL");
    }

    #[test]
    fn test_languages_proficiency() {
        let result = languages(&lines(&[
            "English - Fluent",
            "French (basic)",
            "German, conversational",
        ]));
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].name, "English");
        assert_eq!(result[0].proficiency, Proficiency::Fluent);
        assert_eq!(result[1].name, "French");
        assert_eq!(result[1].proficiency, Proficiency::Basic);
        assert_eq!(result[2].name, "German");
        assert_eq!(result[2].proficiency, Proficiency::Intermediate);
    }

    #[test]
    fn test_languages_strip_bullets() {
        let result = languages(&lines(&["• English (Fluent)", "- Spanish - basic", "* Creole"]));
        let names: Vec<_> = result.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["English", "Spanish", "Creole"]);
        assert_eq!(result[0].proficiency, Proficiency::Fluent);
        assert_eq!(result[1].proficiency, Proficiency::Basic);
    }

    #[test]
    fn test_summary_joins_lines() {
        assert_eq!(
            summary(&lines(&["Backend engineer.", "", "  Loves Rust. "])),
            "Backend engineer. Loves Rust."
        );
    }

    #[test]
    fn test_extract_section_dispatches_by_tag() {
        let content = extract_section(SectionTag::Skills, &lines(&["Rust, SQL"]));
        assert!(matches!(content, SectionContent::Skills(ref s) if s.len() == 2));
    }
}
