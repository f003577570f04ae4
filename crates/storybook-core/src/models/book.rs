use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::IdealFor;

/// Language a book can be printed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookLanguage {
    pub code: String,
    pub name: String,
    /// Unavailable languages are listed but cannot be selected.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Book detail as returned by `GET /books/{slug}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub ideal_for: Option<IdealFor>,
    #[serde(default)]
    pub age_min: Option<u8>,
    #[serde(default)]
    pub age_max: Option<u8>,
    #[serde(default)]
    pub languages: Vec<BookLanguage>,
}

impl Book {
    pub fn language(&self, code: &str) -> Option<&BookLanguage> {
        self.languages
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
    }

    /// Languages that can actually be selected.
    pub fn available_languages(&self) -> impl Iterator<Item = &BookLanguage> {
        self.languages.iter().filter(|l| l.available)
    }
}

/// One page of the catalog listing (`GET /books`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub items: Vec<Book>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

impl BookPage {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(self.page_size as u64).max(1)
    }
}
