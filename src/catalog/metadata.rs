// Plugin header extraction.
// Pulls the WordPress compatibility fields out of a free-form readme.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MARKDOWN_MARKERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`#]").unwrap());
static HTML_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static HTML_ENTITIES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&[^;]+;").unwrap());

static REQUIRES_AT_LEAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)requires at least:\s*([0-9.]+)").unwrap());
static TESTED_UP_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tested up to:\s*([0-9.]+)").unwrap());
static REQUIRES_PHP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)requires php:\s*([0-9.]+)").unwrap());
static STABLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)stable tag:\s*([0-9.v]+|trunk|master|main|dev|develop)").unwrap()
});

/// Header fields of a plugin readme. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmeHeaders {
    pub requires_at_least: String,
    pub tested_up_to: String,
    #[serde(rename = "requiresPHP")]
    pub requires_php: String,
    pub stable_tag: String,
}

impl ReadmeHeaders {
    /// A plugin is treated as installable when it declares a stable tag.
    pub fn is_compatible(&self) -> bool {
        !self.stable_tag.is_empty()
    }
}

/// Strip markdown markers, HTML tags and entities, then trim.
pub fn normalize(readme: &str) -> String {
    let text = MARKDOWN_MARKERS.replace_all(readme, "");
    let text = HTML_TAGS.replace_all(&text, "");
    let text = HTML_ENTITIES.replace_all(&text, "");
    text.trim().to_string()
}

/// Extract the header fields from a readme. Never fails; unmatched fields stay empty.
pub fn extract_headers(readme: &str) -> ReadmeHeaders {
    let clean = normalize(readme);
    let field = |pattern: &Regex| {
        pattern
            .captures(&clean)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };

    ReadmeHeaders {
        requires_at_least: field(&REQUIRES_AT_LEAST),
        tested_up_to: field(&TESTED_UP_TO),
        requires_php: field(&REQUIRES_PHP),
        stable_tag: field(&STABLE_TAG),
    }
}
