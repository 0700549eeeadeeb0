//! # gv-translate
//!
//! Machine translation with a session-scoped memo table. Requests go to a
//! MyMemory-compatible `GET /get?q=..&langpair=..` endpoint; failures return
//! the source text unchanged and are never cached.

mod cache;

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use gv_core::traits::HttpTransport;
use serde::Deserialize;

use crate::cache::BoundedCache;

pub const DEFAULT_API_BASE: &str = "https://api.mymemory.translated.net";
pub const DEFAULT_LANGPAIR: &str = "en|ja";
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Deserialize)]
struct ApiTranslation {
    /// Numeric on success; some error responses send it as a string
    #[serde(rename = "responseStatus")]
    response_status: serde_json::Value,
    #[serde(rename = "responseData")]
    response_data: Option<ApiTranslationData>,
}

#[derive(Debug, Deserialize)]
struct ApiTranslationData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl ApiTranslation {
    fn into_text(self) -> Option<String> {
        let status = match &self.response_status {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        };
        if status != Some(200) {
            return None;
        }
        self.response_data?.translated_text
    }
}

/// Translates text and memoizes results by exact source string.
pub struct Translator {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    langpair: String,
    cache: Mutex<BoundedCache>,
}

impl Translator {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_options(transport, DEFAULT_API_BASE, DEFAULT_LANGPAIR, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_options(
        transport: Arc<dyn HttpTransport>,
        api_base: impl Into<String>,
        langpair: impl Into<String>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            langpair: langpair.into(),
            cache: Mutex::new(BoundedCache::new(cache_capacity)),
        }
    }

    /// Returns the translation of `text`, or `text` itself when blank or
    /// when the translation service fails.
    pub async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        if let Some(hit) = self.cached(text) {
            tracing::debug!(chars = text.chars().count(), "translation cache hit");
            return hit;
        }

        match self.request(text).await {
            Ok(translated) => {
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(text.to_string(), translated.clone());
                translated
            }
            Err(e) => {
                tracing::warn!(error = %e, "translation failed, keeping source text");
                text.to_string()
            }
        }
    }

    /// Translates every element concurrently; output order matches input.
    pub async fn translate_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        join_all(texts.iter().map(|t| self.translate(t.as_ref()))).await
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn cached(&self, text: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
            .cloned()
    }

    async fn request(&self, text: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/get?q={}&langpair={}",
            self.api_base,
            urlencoding::encode(text),
            urlencoding::encode(&self.langpair)
        );

        let resp = self.transport.get(&url).await?;
        if !resp.is_success() {
            anyhow::bail!("translation API responded with status {}", resp.status);
        }
        resp.json::<ApiTranslation>()?
            .into_text()
            .ok_or_else(|| anyhow::anyhow!("translation API returned no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_core::traits::{HttpResponse, MockHttpTransport};

    fn translated(text: &str) -> anyhow::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: serde_json::to_vec(&serde_json::json!({
                "responseData": { "translatedText": text },
                "responseStatus": 200
            }))
            .unwrap(),
        })
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url| url == "https://api.mymemory.translated.net/get?q=Hello%20world&langpair=en%7Cja")
            .times(1)
            .returning(|_| translated("こんにちは世界"));

        let translator = Translator::new(Arc::new(transport));
        assert_eq!(translator.translate("Hello world").await, "こんにちは世界");
        assert_eq!(translator.translate("Hello world").await, "こんにちは世界");
        assert_eq!(translator.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_blank_input_skips_the_service() {
        let translator = Translator::new(Arc::new(MockHttpTransport::new()));
        assert_eq!(translator.translate("").await, "");
        assert_eq!(translator.translate("  \n").await, "  \n");
    }

    #[tokio::test]
    async fn test_failures_return_source_and_are_not_cached() {
        let mut transport = MockHttpTransport::new();
        let mut calls = 0;
        transport.expect_get().times(3).returning(move |_| {
            calls += 1;
            match calls {
                1 => Err(anyhow::anyhow!("timeout")),
                2 => Ok(HttpResponse {
                    status: 200,
                    body: br#"{"responseStatus":"403","responseData":{"translatedText":"QUOTA"}}"#.to_vec(),
                }),
                _ => Ok(HttpResponse { status: 200, body: b"<html>".to_vec() }),
            }
        });

        let translator = Translator::new(Arc::new(transport));
        for _ in 0..3 {
            assert_eq!(translator.translate("Stars").await, "Stars");
        }
        assert_eq!(translator.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().times(2).returning(|url| {
            if url.contains("q=one") {
                translated("いち")
            } else {
                translated("に")
            }
        });

        let translator = Translator::new(Arc::new(transport));
        let out = translator.translate_batch(&["one", "two", ""][..]).await;
        assert_eq!(out, ["いち", "に", ""]);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().times(2).returning(|_| translated("やあ"));

        let translator = Translator::new(Arc::new(transport));
        translator.translate("hi").await;
        translator.clear_cache();
        assert_eq!(translator.cached_len(), 0);
        translator.translate("hi").await;
    }
}
