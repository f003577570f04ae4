//! Catalog listing filters.
//!
//! Filter state is mirrored in two encodings: API query parameters for `GET /books`
//! and a compact URL query string so a listing can be shared, bookmarked and restored
//! on reload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdealFor {
    Boy,
    Girl,
    Unisex,
}

impl IdealFor {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdealFor::Boy => "boy",
            IdealFor::Girl => "girl",
            IdealFor::Unisex => "unisex",
        }
    }
}

impl fmt::Display for IdealFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdealFor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boy" => Ok(IdealFor::Boy),
            "girl" => Ok(IdealFor::Girl),
            "unisex" => Ok(IdealFor::Unisex),
            other => Err(format!("Unknown ideal-for value '{}'", other)),
        }
    }
}

/// Inclusive age bracket, written `min-max` in URLs (e.g. `3-5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for AgeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid age range '{}'. Expected MIN-MAX", s))?;
        let min: u8 = min
            .trim()
            .parse()
            .map_err(|_| format!("Invalid minimum age in '{}'", s))?;
        let max: u8 = max
            .trim()
            .parse()
            .map_err(|_| format!("Invalid maximum age in '{}'", s))?;
        if min > max {
            return Err(format!("Age range '{}' has min greater than max", s));
        }
        Ok(AgeRange { min, max })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogFilters {
    pub search: Option<String>,
    pub ideal_for: Option<IdealFor>,
    pub age_range: Option<AgeRange>,
    pub language: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self {
            search: None,
            ideal_for: None,
            age_range: None,
            language: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogFilters {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.set_search(Some(search.into()));
        self
    }

    // Any filter change sends the listing back to the first page.
    pub fn set_search(&mut self, search: Option<String>) {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if self.search != search {
            self.search = search;
            self.page = 1;
        }
    }

    pub fn set_ideal_for(&mut self, ideal_for: Option<IdealFor>) {
        if self.ideal_for != ideal_for {
            self.ideal_for = ideal_for;
            self.page = 1;
        }
    }

    pub fn set_age_range(&mut self, age_range: Option<AgeRange>) {
        if self.age_range != age_range {
            self.age_range = age_range;
            self.page = 1;
        }
    }

    pub fn set_language(&mut self, language: Option<String>) {
        let language = language.filter(|l| !l.trim().is_empty());
        if self.language != language {
            self.language = language;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Query parameters for `GET /books`. Unset filters are omitted.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(ideal_for) = self.ideal_for {
            params.push(("idealFor", ideal_for.to_string()));
        }
        if let Some(range) = self.age_range {
            params.push(("ageMin", range.min.to_string()));
            params.push(("ageMax", range.max.to_string()));
        }
        if let Some(language) = &self.language {
            params.push(("language", language.clone()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("pageSize", self.page_size.to_string()));
        params
    }

    /// Encode as a URL query string (`q=...&idealFor=...&age=3-5&lang=en&page=2`).
    /// Default values are left out so an unfiltered listing has an empty query.
    pub fn to_url_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(search) = &self.search {
            parts.push(format!("q={}", urlencoding::encode(search)));
        }
        if let Some(ideal_for) = self.ideal_for {
            parts.push(format!("idealFor={}", ideal_for));
        }
        if let Some(range) = self.age_range {
            parts.push(format!("age={}", range));
        }
        if let Some(language) = &self.language {
            parts.push(format!("lang={}", urlencoding::encode(language)));
        }
        if self.page > 1 {
            parts.push(format!("page={}", self.page));
        }
        parts.join("&")
    }

    /// Restore filters from a URL query string. Unknown keys and malformed values
    /// are ignored so a hand-edited URL still yields a usable listing.
    pub fn from_url_query(query: &str) -> Self {
        let mut filters = CatalogFilters::default();
        let query = query.trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let value = match urlencoding::decode(&raw.replace('+', " ")) {
                Ok(v) => v.into_owned(),
                Err(_) => continue,
            };
            match key {
                "q" => filters.search = Some(value).filter(|v| !v.trim().is_empty()),
                "idealFor" => filters.ideal_for = value.parse().ok(),
                "age" => filters.age_range = value.parse().ok(),
                "lang" => filters.language = Some(value).filter(|v| !v.is_empty()),
                "page" => filters.page = value.parse().unwrap_or(1).max(1),
                _ => {}
            }
        }

        filters
    }
}
