//! Unauthenticated GitHub REST reads.
//!
//! Metadata reads are fail-soft: any transport error, non-2xx status or
//! malformed payload is logged and turned into `None` / an empty list.
//! Search is the exception and reports failures to the caller.

use std::sync::Arc;

use futures::future::join_all;
use gv_core::error::{AppError, Result};
use gv_core::models::RepoCoordinate;
use gv_core::traits::HttpTransport;

use crate::links::{extract_repository_references, parse_repository_url};
use crate::types::{ApiRepository, ApiSearchResponse, RepositoryInfo};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TRENDING_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 20;

/// Star floor for the "trending" listing.
const TRENDING_MIN_STARS: u32 = 1000;

/// GitHub API client over an injected transport.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
}

impl GitHubClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_api_base(transport, DEFAULT_API_BASE)
    }

    pub fn with_api_base(transport: Arc<dyn HttpTransport>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches metadata for the repository a GitHub URL points at.
    pub async fn fetch_repository_info(&self, url: &str) -> Option<RepositoryInfo> {
        let Some(repo) = parse_repository_url(url) else {
            tracing::warn!(url, "not a github.com/{{owner}}/{{repo}} URL");
            return None;
        };
        self.fetch_repository(&repo).await
    }

    /// Fetches metadata by coordinate (repository detail page).
    pub async fn fetch_repository(&self, repo: &RepoCoordinate) -> Option<RepositoryInfo> {
        let api_url = format!(
            "{}/repos/{}/{}",
            self.api_base,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        );

        match self.get_json::<ApiRepository>(&api_url).await {
            Ok(found) => Some(found.into()),
            Err(e) => {
                tracing::warn!(repo = %repo.full_name(), error = %e, "failed to fetch repository info");
                None
            }
        }
    }

    /// Most-starred repositories above a fixed star floor, optionally by language.
    ///
    /// Not time-windowed: this is a star-count snapshot, not a trend signal.
    pub async fn fetch_trending_repositories(&self, language: Option<&str>, page_size: u32) -> Vec<RepositoryInfo> {
        let query = match language.filter(|l| !l.trim().is_empty()) {
            Some(lang) => format!("language:{} stars:>{TRENDING_MIN_STARS}", lang.trim()),
            None => format!("stars:>{TRENDING_MIN_STARS}"),
        };

        match self.search(&query, page_size).await {
            Ok(repos) => repos,
            Err(e) => {
                tracing::warn!(?language, error = %e, "failed to fetch trending repositories");
                Vec::new()
            }
        }
    }

    /// Free-text repository search, most-starred first.
    pub async fn search_repositories(&self, query: &str, page_size: u32) -> Result<Vec<RepositoryInfo>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.search(query, page_size).await.map_err(|e| {
            tracing::error!(query, error = %e, "repository search failed");
            AppError::external(e)
        })
    }

    /// Resolves every repository reference in `text` into a card.
    ///
    /// Fetches run concurrently; references that fail to resolve are dropped
    /// and the rest keep their order of appearance.
    pub async fn expand_repository_cards(&self, text: &str) -> Vec<RepositoryInfo> {
        let urls = extract_repository_references(text);
        if urls.is_empty() {
            return Vec::new();
        }
        join_all(urls.iter().map(|url| self.fetch_repository_info(url)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn search(&self, query: &str, page_size: u32) -> anyhow::Result<Vec<RepositoryInfo>> {
        let url = format!(
            "{}/search/repositories?q={}&sort=stars&order=desc&per_page={}",
            self.api_base,
            urlencoding::encode(query),
            page_size
        );
        let found: ApiSearchResponse = self.get_json(&url).await?;
        Ok(found.items.into_iter().map(RepositoryInfo::from).collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let resp = self.transport.get(url).await?;
        if !resp.is_success() {
            anyhow::bail!("GitHub responded with status {}", resp.status);
        }
        resp.json()
    }
}
