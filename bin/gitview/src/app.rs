//! Assembles the stores from the configured plugins.

use std::sync::Arc;
use std::time::Duration;

use gv_config::Settings;
use gv_db_sqlite::SqliteStore;
use gv_github::GitHubClient;
use gv_http::ReqwestTransport;
use gv_storage_local::FileStorage;
use gv_stores::{AnonymousIdentityStore, BookmarkSet, FeedStore, MessagingStore, RepoTimelineStore};
use gv_translate::Translator;

pub struct App {
    pub settings: Settings,
    pub anonymous: AnonymousIdentityStore,
    pub feed: FeedStore,
    pub timeline: RepoTimelineStore,
    pub messaging: MessagingStore,
    pub github: GitHubClient,
    pub translator: Translator,
}

impl App {
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        // 1. Collections
        let db = SqliteStore::connect(&settings.database.url, settings.database.max_connections).await?;
        let db = Arc::new(db);

        // 2. Client-local state
        let local = Arc::new(FileStorage::open(settings.storage.path.clone()).await?);

        // 3. Outbound HTTP
        let transport = Arc::new(ReqwestTransport::with_timeout(
            Duration::from_secs(settings.http.timeout_secs),
            &settings.github.user_agent,
        )?);
        let github = GitHubClient::with_api_base(transport.clone(), settings.github.api_base.clone());
        let translator = Translator::with_options(
            transport,
            settings.translate.api_base.clone(),
            settings.translate.langpair.clone(),
            settings.translate.cache_capacity,
        );

        tracing::info!(database = %settings.database.url, "gitview ready");

        Ok(Self {
            anonymous: AnonymousIdentityStore::new(local.clone()),
            feed: FeedStore::new(db.clone(), BookmarkSet::new(local)),
            timeline: RepoTimelineStore::new(db.clone()),
            messaging: MessagingStore::new(db.clone(), db),
            github,
            translator,
            settings,
        })
    }
}
