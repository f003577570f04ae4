use std::fmt;
use storybook_core::models::CatalogFilters;

/// Cache key: a resource name plus ordered parameters.
///
/// Invalidation works on the resource name, so `invalidate("cart")` drops every
/// cart-related entry regardless of parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn cart() -> Self {
        Self::new("cart")
    }

    pub fn book(slug: &str) -> Self {
        Self::new("book").with_param("slug", slug)
    }

    pub fn books(filters: &CatalogFilters) -> Self {
        filters
            .to_query_params()
            .into_iter()
            .fold(Self::new("books"), |key, (name, value)| {
                key.with_param(name, value)
            })
    }

    pub fn personalization(id: &str) -> Self {
        Self::new("personalization").with_param("id", id)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for (name, value) in &self.params {
            write!(f, ":{}={}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn books_key_depends_on_filters() {
        let a = QueryKey::books(&CatalogFilters::default());
        let b = QueryKey::books(&CatalogFilters::default().with_search("space"));
        assert_ne!(a, b);
        assert_eq!(a.resource(), b.resource());
    }

    #[test]
    fn display_lists_params() {
        assert_eq!(QueryKey::book("space-explorer").to_string(), "book:slug=space-explorer");
        assert_eq!(QueryKey::cart().to_string(), "cart");
    }
}
