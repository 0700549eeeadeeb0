//! # gv-github
//!
//! GitHub metadata and search client: repository cards, the trending
//! listing, free-text search, and repository-URL extraction from post text.

pub mod client;
pub mod links;
pub mod types;

pub use client::{GitHubClient, DEFAULT_API_BASE, DEFAULT_SEARCH_PAGE_SIZE, DEFAULT_TRENDING_PAGE_SIZE};
pub use links::{extract_repository_references, parse_repository_url};
pub use types::RepositoryInfo;
