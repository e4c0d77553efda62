// GitHub API endpoint functions.
// Provides typed methods for the search, repository, contents, readme, and releases endpoints.

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::Result;

use super::client::GitHubClient;
use super::types::{ContentFile, Release, Repository, SearchResults};

const HTML_MEDIA_TYPE: &str = "application/vnd.github.v3.html";

impl GitHubClient {
    /// Search repositories, most starred first.
    pub async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SearchResults> {
        let params = [
            ("q", query),
            ("sort", "stars"),
            ("order", "desc"),
            ("page", &page.to_string()),
            ("per_page", &per_page.to_string()),
        ];
        let response = self
            .get_with_params("/search/repositories", &params)
            .await?;
        let results: SearchResults = decode_json(response).await?;
        Ok(results)
    }

    /// Get a repository by its numeric id.
    pub async fn get_repository(&self, id: &str) -> Result<Repository> {
        let response = self.get(&format!("/repositories/{}", id)).await?;
        let repository: Repository = decode_json(response).await?;
        Ok(repository)
    }

    /// Get a file from the repository's default branch, decoded to text.
    pub async fn get_file_text(&self, owner: &str, repo: &str, path: &str) -> Result<String> {
        let response = self
            .get(&format!("/repos/{}/{}/contents/{}", owner, repo, path))
            .await?;
        let file: ContentFile = decode_json(response).await?;
        decode_content(&file)
    }

    /// Get the repository's default readme, decoded to text.
    pub async fn get_readme_text(&self, owner: &str, repo: &str) -> Result<String> {
        let response = self.get(&format!("/repos/{}/{}/readme", owner, repo)).await?;
        let file: ContentFile = decode_json(response).await?;
        decode_content(&file)
    }

    /// Get the repository's default readme rendered to HTML by GitHub.
    pub async fn get_readme_html(&self, owner: &str, repo: &str) -> Result<String> {
        let response = self
            .get_with_accept(&format!("/repos/{}/{}/readme", owner, repo), HTML_MEDIA_TYPE)
            .await?;
        let html = response.text().await?;
        Ok(html)
    }

    /// Get releases for a repository, newest first.
    pub async fn get_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let response = self
            .get(&format!("/repos/{}/{}/releases", owner, repo))
            .await?;
        let releases: Vec<Release> = decode_json(response).await?;
        Ok(releases)
    }

    /// Archive download URL for a repository's default branch.
    pub fn zipball_url(&self, full_name: &str) -> String {
        format!("{}/repos/{}/zipball", self.base_url(), full_name)
    }
}

/// Buffer a response body and parse it. A body that arrives but does not
/// parse is a JSON fault, not a transport failure.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Decode the base64 payload of a contents response.
/// GitHub wraps the encoded text at 60 columns.
fn decode_content(file: &ContentFile) -> Result<String> {
    if !file.encoding.is_empty() && file.encoding != "base64" {
        tracing::debug!(path = %file.path, encoding = %file.encoding, "Unexpected content encoding");
    }

    let compact: String = file
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_content() {
        let file = ContentFile {
            path: "readme.txt".into(),
            encoding: "base64".into(),
            content: "PT09IERlbW8gPT09ClN0YWJs\nZSB0YWc6IDEuMi4z\n".into(),
        };
        assert_eq!(decode_content(&file).unwrap(), "=== Demo ===\nStable tag: 1.2.3");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let file = ContentFile {
            path: "readme.txt".into(),
            encoding: "base64".into(),
            content: "!!not base64!!".into(),
        };
        assert!(decode_content(&file).is_err());
    }
}
