// Normalized catalog payloads.
// Shapes returned to the front-end for plugin detail and changelog requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{Release, Repository};

use super::metadata::ReadmeHeaders;

/// Branch reported when the repository does not name a default branch.
pub const FALLBACK_BRANCH: &str = "master";

/// Full plugin view: repository, readme, and compatibility classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDetail {
    pub repo: Repository,
    pub readme: String,
    #[serde(rename = "readmeHTML")]
    pub readme_html: String,
    pub is_compatible: bool,
    pub headers: ReadmeHeaders,
    pub download_url: String,
    pub main_branch: String,
}

/// One release in a plugin's changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub url: String,
}

impl From<Release> for ChangelogEntry {
    fn from(release: Release) -> Self {
        let version = release
            .tag_name
            .strip_prefix('v')
            .unwrap_or(&release.tag_name)
            .to_string();

        Self {
            version,
            title: release.name,
            description: release.body,
            date: release.published_at,
            url: release.html_url,
        }
    }
}
