use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel id of a draft that has not been created on the server yet.
pub const TEMP_PERSONALIZATION_ID: &str = "temp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!(
                "Invalid gender '{}'. Must be one of: male, female, other",
                other
            )),
        }
    }
}

/// Validated child information: the wizard's local form data.
///
/// Authoritative for preview rendering even when a server draft exists, since it
/// reflects the latest edits while the draft only reflects the last submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInfo {
    pub child_first_name: String,
    pub child_age: u8,
    /// Remote URL or `data:` URL holding the inline image.
    pub child_photo_url: String,
    pub language_code: String,
    pub gender: Gender,
}

impl ChildInfo {
    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.child_first_name.trim().is_empty() {
            missing.push("childFirstName");
        }
        if self.child_photo_url.trim().is_empty() {
            missing.push("childPhotoUrl");
        }
        if self.language_code.trim().is_empty() {
            missing.push("languageCode");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn to_create_request(&self, book_id: &str) -> CreatePersonalizationRequest {
        CreatePersonalizationRequest {
            book_id: book_id.to_string(),
            child_first_name: self.child_first_name.clone(),
            child_age: self.child_age,
            child_photo_url: self.child_photo_url.clone(),
            language_code: self.language_code.clone(),
            gender: self.gender,
        }
    }
}

/// Server-side personalization draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationDraft {
    pub id: String,
    pub book_id: String,
    pub child_first_name: String,
    pub child_age: u8,
    pub child_photo_url: String,
    pub language_code: String,
    pub gender: Gender,
    /// Server-controlled lifecycle tag.
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_book_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PersonalizationDraft {
    /// Whether the server has assigned a real id.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty() && self.id != TEMP_PERSONALIZATION_ID
    }

    /// Whether every field a cart item depends on is populated.
    pub fn is_complete(&self) -> bool {
        !self.child_first_name.trim().is_empty()
            && !self.child_photo_url.trim().is_empty()
            && !self.language_code.trim().is_empty()
    }

    pub fn child_info(&self) -> ChildInfo {
        ChildInfo {
            child_first_name: self.child_first_name.clone(),
            child_age: self.child_age,
            child_photo_url: self.child_photo_url.clone(),
            language_code: self.language_code.clone(),
            gender: self.gender,
        }
    }
}

/// Body of `POST /personalizations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonalizationRequest {
    pub book_id: String,
    pub child_first_name: String,
    pub child_age: u8,
    pub child_photo_url: String,
    pub language_code: String,
    pub gender: Gender,
}

/// Body of `PUT /personalizations/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePersonalizationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

/// Response of `POST /personalizations/{id}/upload-photo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoResponse {
    pub photo_url: String,
    pub personalization: PersonalizationDraft,
}

/// Guest draft held in the `pendingPersonalization` slot until login or checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPersonalization {
    /// Always [`TEMP_PERSONALIZATION_ID`].
    pub id: String,
    pub book_id: String,
    pub book_slug: String,
    #[serde(flatten)]
    pub child: ChildInfo,
    pub saved_at: DateTime<Utc>,
}

impl PendingPersonalization {
    pub fn new(book_id: &str, book_slug: &str, child: ChildInfo) -> Self {
        Self {
            id: TEMP_PERSONALIZATION_ID.to_string(),
            book_id: book_id.to_string(),
            book_slug: book_slug.to_string(),
            child,
            saved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mia() -> ChildInfo {
        ChildInfo {
            child_first_name: "Mia".to_string(),
            child_age: 6,
            child_photo_url: "data:image/png;base64,AAAA".to_string(),
            language_code: "en".to_string(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn create_request_serializes_expected_fields() {
        let req = mia().to_create_request("b-1");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "bookId": "b-1",
                "childFirstName": "Mia",
                "childAge": 6,
                "childPhotoUrl": "data:image/png;base64,AAAA",
                "languageCode": "en",
                "gender": "female"
            })
        );
    }

    #[test]
    fn temp_draft_is_not_persisted() {
        let draft: PersonalizationDraft = serde_json::from_value(serde_json::json!({
            "id": "temp",
            "bookId": "b-1",
            "childFirstName": "Mia",
            "childAge": 6,
            "childPhotoUrl": "https://cdn.example.com/mia.png",
            "languageCode": "en",
            "gender": "female"
        }))
        .unwrap();
        assert!(!draft.is_persisted());
        assert!(draft.is_complete());
        assert_eq!(draft.child_info().child_first_name, "Mia");
    }

    #[test]
    fn missing_fields_reports_blank_values() {
        let mut info = mia();
        info.child_first_name = "  ".to_string();
        info.child_photo_url.clear();
        assert_eq!(info.missing_fields(), vec!["childFirstName", "childPhotoUrl"]);
        assert!(!info.is_complete());
    }

    #[test]
    fn pending_personalization_flattens_child_fields() {
        let pending = PendingPersonalization::new("b-1", "space-explorer", mia());
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["id"], "temp");
        assert_eq!(value["childFirstName"], "Mia");
        assert_eq!(value["bookSlug"], "space-explorer");
        let back: PendingPersonalization = serde_json::from_value(value).unwrap();
        assert_eq!(back.child, mia());
    }
}
