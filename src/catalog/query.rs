// Catalog search query construction.
// Turns list parameters into a GitHub search query and a cache key.

use serde::Deserialize;

use super::featured::FeaturedList;

/// Topic every catalog repository is tagged with.
pub const CATALOG_TOPIC: &str = "wordpress-plugin";

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 10;
/// Largest page size the search API accepts.
const MAX_PER_PAGE: u32 = 100;

/// Raw `/plugins` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub q: Option<String>,
    pub author: Option<String>,
    pub filter: Option<String>,
}

/// Normalized list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u32,
    pub per_page: u32,
    pub query: String,
    pub author: String,
    pub filter: String,
}

/// Search string plus whether it came from the featured list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub featured: bool,
}

impl From<ListParams> for ListRequest {
    fn from(params: ListParams) -> Self {
        Self {
            page: parse_positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            per_page: parse_positive(params.per_page.as_deref())
                .unwrap_or(DEFAULT_PER_PAGE)
                .min(MAX_PER_PAGE),
            query: params.q.unwrap_or_default(),
            author: params.author.unwrap_or_default(),
            filter: params.filter.unwrap_or_default(),
        }
    }
}

impl ListRequest {
    /// True when nothing narrows the listing, i.e. the featured view.
    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty() && self.author.is_empty() && self.filter.is_empty()
    }

    pub fn cache_key(&self) -> String {
        format!(
            "plugins:{}:{}:{}:{}:{}",
            self.page, self.per_page, self.query, self.author, self.filter
        )
    }

    pub fn search_query(&self, featured: &FeaturedList) -> SearchQuery {
        if self.is_unfiltered() {
            return SearchQuery {
                q: featured.search_query(),
                featured: true,
            };
        }

        let mut q = format!("topic:{}", CATALOG_TOPIC);

        if !self.author.is_empty() {
            q = format!("user:{} {}", self.author, q);
        }

        if !self.query.is_empty() {
            q = format!("{} in:name,description,readme {}", self.query, q);
        }

        // Filter-only listing: prefer repositories that publish a stable tag.
        if self.query.is_empty() && self.author.is_empty() {
            q.push_str(" in:readme \"stable tag\"");
        }

        SearchQuery { q, featured: false }
    }
}

/// Leading decimal digits as a positive number, so `3abc` and `2.5` read as
/// 3 and 2.
fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim_start();
    let digits = raw
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw, |end| &raw[..end]);
    digits.parse::<u32>().ok().filter(|v| *v > 0)
}
