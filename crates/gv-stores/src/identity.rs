//! Who is acting: the identity-provider session and the anonymous fallback.

use std::sync::Arc;

use gv_core::error::{AppError, Result};
use gv_core::models::{ProviderKind, UserId, UserProfile};
use gv_core::traits::{IdentityProvider, LocalStorage};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

/// Storage key of the anonymous token.
pub const ANONYMOUS_ID_KEY: &str = "gitview_anonymous_uuid";

/// A random token created once per client and kept indefinitely.
///
/// Not scoped to any account: every identity using the same local storage
/// shares it.
pub struct AnonymousIdentityStore {
    storage: Arc<dyn LocalStorage>,
    /// Serializes first-time creation
    init: Mutex<()>,
}

impl AnonymousIdentityStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            init: Mutex::new(()),
        }
    }

    /// Returns the stored token, generating and persisting one on first use.
    pub async fn get_or_create(&self) -> Result<UserId> {
        let _guard = self.init.lock().await;

        if let Some(existing) = self
            .storage
            .get_item(ANONYMOUS_ID_KEY)
            .await
            .map_err(AppError::external)?
            .filter(|v| !v.is_empty())
        {
            return Ok(existing);
        }

        let token = Uuid::new_v4().to_string();
        self.storage
            .set_item(ANONYMOUS_ID_KEY, &token)
            .await
            .map_err(AppError::external)?;
        tracing::info!("created anonymous identity");
        Ok(token)
    }
}

/// Injected session context over an identity provider.
///
/// The current user is published on a watch channel so consumers can
/// subscribe instead of reading shared global state.
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    current: watch::Sender<Option<UserProfile>>,
}

impl SessionContext {
    /// Starts with whatever session the provider already holds.
    pub async fn initialize(provider: Arc<dyn IdentityProvider>) -> Self {
        let restored = provider.restore_session().await;
        let (current, _) = watch::channel(restored);
        Self { provider, current }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.current.subscribe()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.current.borrow().clone()
    }

    /// Signs in and publishes the new user.
    ///
    /// An email already linked under another provider surfaces as
    /// [`AppError::AccountConflict`].
    pub async fn sign_in(&self, kind: ProviderKind) -> Result<UserProfile> {
        match self.provider.sign_in(kind).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, ?kind, "signed in");
                self.current.send_replace(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(?kind, error = %e, "sign-in failed");
                Err(e.into())
            }
        }
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await.map_err(|e| {
            tracing::warn!(error = %e, "sign-out failed");
            AppError::from(e)
        })?;
        self.current.send_replace(None);
        Ok(())
    }

    /// Caller-side guard for actions that need a real account.
    pub fn require_user(&self) -> Result<UserProfile> {
        self.current_user().ok_or(AppError::AuthRequired)
    }

    /// The signed-in user's id, else the anonymous token.
    pub async fn acting_user_id(&self, anonymous: &AnonymousIdentityStore) -> Result<UserId> {
        match self.current_user() {
            Some(user) => Ok(user.id),
            None => anonymous.get_or_create().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_core::error::ProviderError;
    use gv_core::traits::MockIdentityProvider;
    use gv_storage_local::MemoryStorage;

    fn ada() -> UserProfile {
        UserProfile {
            id: "gh-ada".into(),
            display_name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_anonymous_token_is_stable() {
        let storage = Arc::new(MemoryStorage::new());
        let store = AnonymousIdentityStore::new(storage.clone());

        let first = store.get_or_create().await.unwrap();
        let second = store.get_or_create().await.unwrap();
        assert_eq!(first, second);

        let again = AnonymousIdentityStore::new(storage);
        assert_eq!(again.get_or_create().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_sign_in_publishes_and_sign_out_clears() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_restore_session().returning(|| None);
        provider.expect_sign_in().times(1).returning(|_| Ok(ada()));
        provider.expect_sign_out().times(1).returning(|| Ok(()));

        let session = SessionContext::initialize(Arc::new(provider)).await;
        let mut rx = session.subscribe();
        assert!(matches!(session.require_user(), Err(AppError::AuthRequired)));

        session.sign_in(ProviderKind::GitHub).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.id.clone()), Some("gh-ada".into()));

        session.sign_out().await.unwrap();
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_account_conflict_is_distinct() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_restore_session().returning(|| None);
        provider.expect_sign_in().returning(|_| {
            Err(ProviderError::AccountExistsWithDifferentCredential {
                email: "ada@example.com".into(),
            })
        });

        let session = SessionContext::initialize(Arc::new(provider)).await;
        let err = session.sign_in(ProviderKind::Google).await.unwrap_err();
        assert!(matches!(err, AppError::AccountConflict { .. }));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_acting_user_prefers_session() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_restore_session().returning(|| Some(ada()));
        let session = SessionContext::initialize(Arc::new(provider)).await;

        let anonymous = AnonymousIdentityStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(session.acting_user_id(&anonymous).await.unwrap(), "gh-ada");
    }
}
