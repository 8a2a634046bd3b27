use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::cv::PersonalInfo;

/// Phone candidates with fewer digits than this are dates or counts, not numbers.
const MIN_PHONE_DIGITS: usize = 7;

pub(crate) static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\(?\d{1,4}\)?(?:[ \t.\-]?\(?\d{1,4}\)?){2,}").unwrap());

static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/in/[A-Za-z0-9_%\-]+/?").unwrap()
});

static HOMEPAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s|,;]+").unwrap());

/// Contact details found anywhere in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profile_url: String,
    pub homepage: String,
}

impl From<ContactInfo> for PersonalInfo {
    fn from(contact: ContactInfo) -> Self {
        PersonalInfo {
            full_name: contact.full_name,
            email: contact.email,
            phone: contact.phone,
            profile_url: contact.profile_url,
            homepage: contact.homepage,
            ..PersonalInfo::default()
        }
    }
}

/// Scans every line; for each field the first line with a match wins.
///
/// `full_name` is simply the first non-empty line. It is a positional guess
/// the user is expected to review.
pub fn extract<'a>(lines: impl IntoIterator<Item = &'a str>) -> ContactInfo {
    let mut info = ContactInfo::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if info.full_name.is_empty() {
            info.full_name = line.to_string();
        }

        if info.email.is_empty() {
            if let Some(m) = EMAIL.find(line) {
                info.email = m.as_str().to_string();
            }
        }

        if info.phone.is_empty() {
            if let Some(phone) = find_phone(line) {
                info.phone = phone;
            }
        }

        let profile = PROFILE_URL.find(line);
        if info.profile_url.is_empty() {
            if let Some(m) = profile {
                info.profile_url = m.as_str().trim_end_matches('/').to_string();
            }
        }

        if info.homepage.is_empty() && profile.is_none() {
            if let Some(m) = HOMEPAGE.find(line) {
                info.homepage = m.as_str().trim_end_matches(['.', ')']).to_string();
            }
        }
    }

    info
}

fn find_phone(line: &str) -> Option<String> {
    PHONE
        .find_iter(line)
        .map(|m| m.as_str().trim())
        .find(|candidate| candidate.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_all_fields() {
        let lines = [
            "Jane Doe",
            "jane.doe@example.com | +230 5123 4567",
            "linkedin.com/in/janedoe",
            "Portfolio: https://janedoe.dev",
        ];
        let info = extract(lines);
        assert_eq!(info.full_name, "Jane Doe");
        assert_eq!(info.email, "jane.doe@example.com");
        assert_eq!(info.phone, "+230 5123 4567");
        assert_eq!(info.profile_url, "linkedin.com/in/janedoe");
        assert_eq!(info.homepage, "https://janedoe.dev");
    }

    #[test]
    fn test_first_email_wins() {
        let info = extract(["Jane", "first@example.com", "second@example.org"]);
        assert_eq!(info.email, "first@example.com");
    }

    #[test]
    fn test_full_name_skips_blank_lines() {
        let info = extract(["", "   ", "  John Smith  ", "Engineer"]);
        assert_eq!(info.full_name, "John Smith");
    }

    #[test]
    fn test_linkedin_url_not_counted_as_homepage() {
        let info = extract(["Jane", "https://www.LinkedIn.com/in/jane-doe/"]);
        assert_eq!(info.profile_url, "https://www.LinkedIn.com/in/jane-doe");
        assert_eq!(info.homepage, "");
    }

    #[test]
    fn test_homepage_found_on_later_line() {
        let info = extract([
            "Jane",
            "https://linkedin.com/in/jane",
            "See https://github.com/jane, thanks",
        ]);
        assert_eq!(info.homepage, "https://github.com/jane");
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(find_phone("Tel: (555) 123-4567").as_deref(), Some("(555) 123-4567"));
        assert_eq!(find_phone("+44 20.7946.0958").as_deref(), Some("+44 20.7946.0958"));
    }

    #[test]
    fn test_years_are_not_phones() {
        assert_eq!(find_phone("2016"), None);
        assert_eq!(find_phone("2019 - present"), None);
        let info = extract(["Jane", "Graduated 2016", "Phone 0612 345 678"]);
        assert_eq!(info.phone, "0612 345 678");
    }

    #[test]
    fn test_missing_fields_stay_empty() {
        let info = extract(["Only a name"]);
        assert_eq!(info.email, "");
        assert_eq!(info.phone, "");
        assert_eq!(info.profile_url, "");
        assert_eq!(info.homepage, "");
    }

    #[test]
    fn test_into_personal_info() {
        let info = extract(["Jane", "jane@example.com"]);
        let personal: PersonalInfo = info.into();
        assert_eq!(personal.email, "jane@example.com");
        assert_eq!(personal.address, "");
        assert!(personal.photo.is_none());
    }
}
