//! Child information validation
//!
//! Rules applied by the child-info form before submission:
//! - First name: required, at most 25 characters
//! - Age: integer in [0, 18]
//! - Language: required, must be offered and available for the book
//! - Gender: required
//! - Photo: a local (inline) or remote URL is required

use crate::error::ValidationError;
use crate::models::{BookLanguage, Gender};

/// Maximum length for the child's first name (25 characters)
pub const MAX_CHILD_NAME_LENGTH: usize = 25;

pub const MIN_CHILD_AGE: i64 = 0;
pub const MAX_CHILD_AGE: i64 = 18;

pub fn validate_child_first_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::field(
            "childFirstName",
            "Child's first name is required",
        ));
    }

    let length = trimmed.chars().count();
    if length > MAX_CHILD_NAME_LENGTH {
        return Err(ValidationError::field(
            "childFirstName",
            format!(
                "Name must be at most {} characters (got {})",
                MAX_CHILD_NAME_LENGTH, length
            ),
        ));
    }

    Ok(())
}

/// Validate the age and narrow it to `u8`.
pub fn validate_child_age(age: Option<i64>) -> Result<u8, ValidationError> {
    let age = age.ok_or_else(|| ValidationError::field("childAge", "Child's age is required"))?;
    if !(MIN_CHILD_AGE..=MAX_CHILD_AGE).contains(&age) {
        return Err(ValidationError::field(
            "childAge",
            format!(
                "Age must be between {} and {}",
                MIN_CHILD_AGE, MAX_CHILD_AGE
            ),
        ));
    }
    Ok(age as u8)
}

/// Validate the selected language against the book's language list.
///
/// Languages flagged unavailable are rejected. An empty list means the book did not
/// advertise languages, in which case any non-empty code is accepted.
pub fn validate_language(
    code: Option<&str>,
    languages: &[BookLanguage],
) -> Result<String, ValidationError> {
    let code = code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ValidationError::field("languageCode", "Please select a language"))?;

    if languages.is_empty() {
        return Ok(code.to_string());
    }

    match languages.iter().find(|l| l.code.eq_ignore_ascii_case(code)) {
        Some(lang) if lang.available => Ok(lang.code.clone()),
        Some(lang) => Err(ValidationError::field(
            "languageCode",
            format!("{} is not available for this book yet", lang.name),
        )),
        None => Err(ValidationError::field(
            "languageCode",
            format!("Language '{}' is not offered for this book", code),
        )),
    }
}

pub fn validate_gender(gender: Option<Gender>) -> Result<Gender, ValidationError> {
    gender.ok_or_else(|| ValidationError::field("gender", "Please select a gender"))
}

pub fn validate_photo_url(url: Option<&str>) -> Result<String, ValidationError> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ValidationError::field("childPhotoUrl", "Please add a photo of the child"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages() -> Vec<BookLanguage> {
        vec![
            BookLanguage {
                code: "en".to_string(),
                name: "English".to_string(),
                available: true,
            },
            BookLanguage {
                code: "ar".to_string(),
                name: "Arabic".to_string(),
                available: false,
            },
        ]
    }

    #[test]
    fn name_length_boundary() {
        assert!(validate_child_first_name(&"a".repeat(25)).is_ok());
        assert!(validate_child_first_name(&"a".repeat(26)).is_err());
        assert!(validate_child_first_name("   ").is_err());
        // Characters, not bytes
        assert!(validate_child_first_name(&"é".repeat(25)).is_ok());
    }

    #[test]
    fn age_bounds_are_inclusive() {
        assert_eq!(validate_child_age(Some(0)).unwrap(), 0);
        assert_eq!(validate_child_age(Some(18)).unwrap(), 18);
        assert!(validate_child_age(Some(-1)).is_err());
        assert!(validate_child_age(Some(19)).is_err());
        assert!(validate_child_age(None).is_err());
    }

    #[test]
    fn unavailable_language_is_rejected() {
        assert_eq!(validate_language(Some("EN"), &languages()).unwrap(), "en");
        let err = validate_language(Some("ar"), &languages()).unwrap_err();
        assert!(err.to_string().contains("not available"));
        assert!(validate_language(Some("de"), &languages()).is_err());
        assert!(validate_language(None, &languages()).is_err());
        assert_eq!(validate_language(Some("de"), &[]).unwrap(), "de");
    }

    #[test]
    fn gender_and_photo_are_required() {
        assert!(validate_gender(None).is_err());
        assert_eq!(validate_gender(Some(Gender::Other)).unwrap(), Gender::Other);
        assert!(validate_photo_url(Some("")).is_err());
        assert!(validate_photo_url(Some("https://cdn.example.com/a.png")).is_ok());
    }
}
