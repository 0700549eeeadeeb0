//! Finding GitHub repository URLs in free text.

use gv_core::models::RepoCoordinate;
use url::Url;

const GITHUB_HOST_PREFIX: &str = "github.com/";
const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', '>'];

/// Returns every `http(s)://github.com/...` URL in `text`, in order of
/// appearance, duplicates included.
///
/// A URL runs to the next whitespace; trailing sentence punctuation is
/// not part of it.
pub fn extract_repository_references(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find("http") {
        let start = pos + offset;
        let end = text[start..]
            .find(char::is_whitespace)
            .map_or(text.len(), |e| start + e);

        match github_url(&text[start..end]) {
            Some(url) => {
                found.push(url.to_string());
                pos = end;
            }
            // A later "http" inside the same token may still start a match.
            None => pos = start + "http".len(),
        }
    }

    found
}

fn github_url(token: &str) -> Option<&str> {
    let after_scheme = token
        .strip_prefix("https://")
        .or_else(|| token.strip_prefix("http://"))?;
    let path = after_scheme.strip_prefix(GITHUB_HOST_PREFIX)?;

    let trimmed_len = path.trim_end_matches(TRAILING_PUNCTUATION).len();
    if trimmed_len == 0 {
        return None;
    }
    let cut = token.len() - (path.len() - trimmed_len);
    Some(&token[..cut])
}

/// Extracts `owner` and `repo` from a `github.com/{owner}/{repo}` URL.
///
/// The host must be exactly `github.com` (or `www.github.com`); a URL
/// without a scheme is read as https. Anything after the repository
/// segment (sub-paths, query, fragment) and a `.git` suffix are ignored.
pub fn parse_repository_url(url: &str) -> Option<RepoCoordinate> {
    let parsed = if url.contains("://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("https://{url}"))
    }
    .ok()?;

    if !matches!(parsed.scheme(), "http" | "https") || !GITHUB_HOSTS.contains(&parsed.host_str()?) {
        return None;
    }

    let mut segments = parsed.path_segments()?;
    let owner = segments.next()?;
    let raw_name = segments.next()?;
    let name = raw_name.strip_suffix(".git").unwrap_or(raw_name);

    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(RepoCoordinate::new(owner, name))
}
