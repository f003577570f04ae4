//! Child-info form (step 1)
//!
//! Holds raw user input and turns it into a validated [`ChildInfo`]. The form
//! never persists anything itself; the wizard decides what to do with the result.

use storybook_core::models::{Book, ChildInfo, Gender};
use storybook_core::validation::{
    validate_child_age, validate_child_first_name, validate_gender, validate_language,
    validate_photo_url,
};
use storybook_core::ValidationErrors;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildInfoForm {
    pub child_first_name: String,
    pub child_age: Option<i64>,
    pub language_code: Option<String>,
    pub gender: Option<Gender>,
}

impl ChildInfoForm {
    /// Empty form preselecting the book's language when it offers exactly one.
    pub fn for_book(book: &Book) -> Self {
        let mut available = book.available_languages();
        let language_code = match (available.next(), available.next()) {
            (Some(only), None) => Some(only.code.clone()),
            _ => None,
        };
        Self {
            language_code,
            ..Self::default()
        }
    }

    /// Form fully reset to previously submitted data.
    pub fn from_child_info(info: &ChildInfo) -> Self {
        Self {
            child_first_name: info.child_first_name.clone(),
            child_age: Some(i64::from(info.child_age)),
            language_code: Some(info.language_code.clone()),
            gender: Some(info.gender),
        }
    }

    /// Validate every field, collecting all errors.
    pub fn validate(
        &self,
        photo_url: Option<&str>,
        book: &Book,
    ) -> Result<ChildInfo, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_child_first_name(&self.child_first_name) {
            errors.push(e);
        }
        let age = validate_child_age(self.child_age).map_err(|e| errors.push(e)).ok();
        let language = validate_language(self.language_code.as_deref(), &book.languages)
            .map_err(|e| errors.push(e))
            .ok();
        let gender = validate_gender(self.gender).map_err(|e| errors.push(e)).ok();
        let photo = validate_photo_url(photo_url).map_err(|e| errors.push(e)).ok();

        match (age, language, gender, photo) {
            (Some(child_age), Some(language_code), Some(gender), Some(child_photo_url))
                if errors.is_empty() =>
            {
                Ok(ChildInfo {
                    child_first_name: self.child_first_name.trim().to_string(),
                    child_age,
                    child_photo_url,
                    language_code,
                    gender,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storybook_core::models::BookLanguage;

    fn book(languages: Vec<BookLanguage>) -> Book {
        Book {
            id: "b-1".to_string(),
            slug: "space-explorer".to_string(),
            title: "Space Explorer".to_string(),
            description: None,
            price: None,
            cover_image_url: None,
            ideal_for: None,
            age_min: None,
            age_max: None,
            languages,
        }
    }

    fn english() -> BookLanguage {
        BookLanguage {
            code: "en".to_string(),
            name: "English".to_string(),
            available: true,
        }
    }

    fn filled() -> ChildInfoForm {
        ChildInfoForm {
            child_first_name: "  Mia ".to_string(),
            child_age: Some(6),
            language_code: Some("en".to_string()),
            gender: Some(Gender::Female),
        }
    }

    #[test]
    fn valid_form_produces_trimmed_child_info() {
        let info = filled()
            .validate(Some("https://cdn.example.com/mia.png"), &book(vec![english()]))
            .unwrap();
        assert_eq!(info.child_first_name, "Mia");
        assert_eq!(info.child_age, 6);
    }

    #[test]
    fn collects_every_error() {
        let form = ChildInfoForm {
            child_first_name: "a".repeat(26),
            child_age: Some(19),
            language_code: None,
            gender: None,
        };
        let errors = form.validate(None, &book(vec![english()])).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.for_field("childAge").is_some());
        assert!(errors.for_field("childPhotoUrl").is_some());
    }

    #[test]
    fn single_language_is_preselected() {
        assert_eq!(
            ChildInfoForm::for_book(&book(vec![english()])).language_code.as_deref(),
            Some("en")
        );
        let mut french = english();
        french.code = "fr".to_string();
        assert_eq!(ChildInfoForm::for_book(&book(vec![english(), french])).language_code, None);
    }

    #[test]
    fn rehydrates_from_submitted_data() {
        let info = filled()
            .validate(Some("https://cdn.example.com/mia.png"), &book(vec![]))
            .unwrap();
        let form = ChildInfoForm::from_child_info(&info);
        assert_eq!(form.child_first_name, "Mia");
        assert_eq!(form.child_age, Some(6));
        assert_eq!(form.gender, Some(Gender::Female));
    }
}
