use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Skill level assigned when the source text carries no proficiency signal (1–5 scale).
pub const DEFAULT_SKILL_LEVEL: u8 = 3;

/// Maximum number of characters kept from the summary section.
pub const SUMMARY_MAX_CHARS: usize = 300;

/// Structured candidate profile produced by one parse call.
///
/// Owned by the caller; nothing in the pipeline keeps a reference to it.
/// Absent values are empty strings or empty lists, never `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<SkillEntry>,
    pub languages: Vec<LanguageEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub profile_url: String,
    pub homepage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String, // always "" when `current`
    pub current: bool,
    pub description: String,
}

impl ExperienceEntry {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            company: String::new(),
            role: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            current: false,
            description: String::new(),
        }
    }
}

impl Default for ExperienceEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
    pub id: Uuid,
    pub name: String,
    pub level: u8,
}

impl SkillEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            level: DEFAULT_SKILL_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Proficiency {
    Basic,
    #[default]
    Intermediate,
    Fluent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub id: Uuid,
    pub name: String,
    pub proficiency: Proficiency,
}
