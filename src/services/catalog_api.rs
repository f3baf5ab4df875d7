//! Trait and types for interacting with an open-data catalog.

use anyhow::Result;

/// One downloadable file published under a catalog package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub format: Option<String>,
    pub url: Option<String>,
    pub last_modified: Option<String>,
}

impl Resource {
    /// Returns `true` if the resource is a CSV file with a download URL.
    pub fn is_csv(&self) -> bool {
        self.url.is_some()
            && self
                .format
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case("csv"))
    }
}

/// Picks the most recently modified CSV resource.
pub fn latest_csv(resources: &[Resource]) -> Option<&Resource> {
    resources
        .iter()
        .filter(|r| r.is_csv())
        .max_by(|a, b| a.last_modified.cmp(&b.last_modified))
}

/// Abstraction over a dataset catalog provider (e.g., a CKAN portal).
#[async_trait::async_trait]
pub trait CatalogApi {
    /// Returns every resource published under `package`.
    async fn list_resources(&self, package: &str) -> Result<Vec<Resource>>;
}
