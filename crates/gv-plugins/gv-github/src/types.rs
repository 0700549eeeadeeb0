//! GitHub API data types and their normalized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository metadata as shown on a repository card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Empty when GitHub has none
    pub description: String,
    /// Primary language, empty when GitHub has none
    pub language: String,
    pub stars: u64,
    pub owner: String,
    pub owner_avatar: String,
    /// Canonical web URL (`html_url`)
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The subset of `GET /repos/{owner}/{repo}` that cards use.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRepository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: Option<u64>,
    pub owner: ApiOwner,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiOwner {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// `GET /search/repositories` envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiSearchResponse {
    #[serde(default)]
    pub items: Vec<ApiRepository>,
}

impl From<ApiRepository> for RepositoryInfo {
    fn from(repo: ApiRepository) -> Self {
        Self {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description.unwrap_or_default(),
            language: repo.language.unwrap_or_default(),
            stars: repo.stargazers_count.unwrap_or(0),
            owner: repo.owner.login,
            owner_avatar: repo.owner.avatar_url.unwrap_or_default(),
            url: repo.html_url,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}
