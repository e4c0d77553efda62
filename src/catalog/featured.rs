// Featured plugin list.
// The curated repositories shown when the catalog is opened without any search.

use std::sync::Arc;

use crate::github::Repository;

/// Built-in featured repositories, in display order.
pub const DEFAULT_FEATURED: &[&str] = &[
    "WordPress/performance",
    "WordPress/plugin-check",
    "WordPress/two-factor",
    "afragen/git-updater",
    "wp-graphql/wp-graphql",
    "humanmade/S3-Uploads",
    "WordPress/wordpress-importer",
    "WP-API/Basic-Auth",
];

/// Immutable, ordered list of `owner/name` identifiers.
#[derive(Debug, Clone)]
pub struct FeaturedList(Arc<[String]>);

impl FeaturedList {
    pub fn new<I, S>(repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(repos.into_iter().map(Into::into).collect())
    }

    /// Parse a comma separated override, falling back to the built-in list
    /// when it names no repositories.
    pub fn from_list(raw: Option<&str>) -> Self {
        let parsed: Vec<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if parsed.is_empty() {
            Self::default()
        } else {
            Self::new(parsed)
        }
    }

    pub fn repos(&self) -> &[String] {
        &self.0
    }

    /// Search query matching any featured repository.
    pub fn search_query(&self) -> String {
        self.0
            .iter()
            .map(|repo| format!("repo:{}", repo))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arrange search results in featured order.
    ///
    /// Selects, for each featured identifier in turn, the first result whose
    /// `full_name` matches exactly. Featured repositories missing from the
    /// results are skipped and results outside the list are dropped.
    pub fn reorder(&self, items: Vec<Repository>) -> Vec<Repository> {
        let mut pool: Vec<Option<Repository>> = items.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(self.0.len());

        for featured in self.0.iter() {
            let found = pool.iter_mut().find(|slot| {
                slot.as_ref()
                    .is_some_and(|repo| repo.full_name == *featured)
            });
            if let Some(repo) = found.and_then(Option::take) {
                ordered.push(repo);
            }
        }

        ordered
    }
}

impl Default for FeaturedList {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURED.iter().copied())
    }
}
