use std::sync::Arc;

use tracing::debug;

use crate::app::ports::{AccountRepository, TokenPayload, TokenPort, TokenProfiles};
use crate::domain::AccountChanges;
use crate::error::Result;

/// Mints a new access token from a refresh token.
///
/// A presented token that expires before the stored one is older than the current
/// session and is refused. Equal expiry (both issued in the same second) is accepted.
pub struct RefreshTokenUseCase {
    accounts: Arc<dyn AccountRepository>,
    token: Arc<dyn TokenPort>,
    profiles: TokenProfiles,
}

impl RefreshTokenUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        token: Arc<dyn TokenPort>,
        profiles: TokenProfiles,
    ) -> Self {
        Self {
            accounts,
            token,
            profiles,
        }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<String>> {
        let presented = match self.token.parse(refresh_token, &self.profiles.refresh).await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Refresh token rejected: {}: {}", e.name, e.message);
                return Ok(None);
            }
        };

        let Some(account) = self.accounts.find_by_id(&presented.payload.id).await? else {
            return Ok(None);
        };
        let Some(stored_token) = account.refresh_token.as_deref() else {
            return Ok(None);
        };
        let Ok(stored) = self.token.parse(stored_token, &self.profiles.refresh).await else {
            return Ok(None);
        };

        if presented.expires_in < stored.expires_in {
            debug!("Superseded refresh token presented for account {}", account.id);
            return Ok(None);
        }

        let access_token = self
            .token
            .generate(&TokenPayload::for_account(account.id.clone()), &self.profiles.access)
            .await?;

        let changes = AccountChanges {
            access_token: Some(access_token.clone()),
            ..Default::default()
        };
        if self.accounts.update(changes, &account.id).await?.is_none() {
            return Ok(None);
        }

        crate::observability::metrics::auth::token_refreshed();
        Ok(Some(access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{issue, seed_account, token_port, token_profiles};
    use crate::storage::InMemoryStore;

    async fn store_refresh_token(store: &InMemoryStore, id: &str, token: &str) {
        store
            .accounts()
            .update(
                AccountChanges {
                    refresh_token: Some(token.to_string()),
                    ..Default::default()
                },
                id,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_current_refresh_token_mints_and_stores_access_token() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        let profiles = token_profiles();
        let refresh = issue(TokenPayload::for_account("acc-1"), &profiles.refresh).await;
        store_refresh_token(&store, "acc-1", &refresh).await;

        let use_case = RefreshTokenUseCase::new(Arc::new(store.accounts()), token_port(), profiles);
        let access = use_case.refresh(&refresh).await.unwrap().unwrap();

        let stored = store.accounts().find_by_id("acc-1").await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some(access.as_str()));
        assert_eq!(stored.refresh_token.as_deref(), Some(refresh.as_str()));
    }

    #[tokio::test]
    async fn test_older_refresh_token_is_refused() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        let profiles = token_profiles();
        let older = issue(TokenPayload::for_account("acc-1"), &profiles.refresh).await;

        let mut newer_profile = profiles.refresh.clone();
        newer_profile.expires_in_secs += 60;
        let newer = issue(TokenPayload::for_account("acc-1"), &newer_profile).await;
        store_refresh_token(&store, "acc-1", &newer).await;

        let use_case = RefreshTokenUseCase::new(Arc::new(store.accounts()), token_port(), profiles);
        assert!(use_case.refresh(&older).await.unwrap().is_none());
        assert!(use_case.refresh(&newer).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_garbage_wrong_purpose_and_unknown_account() {
        let store = InMemoryStore::new();
        let profiles = token_profiles();
        let access = issue(TokenPayload::for_account("acc-1"), &profiles.access).await;
        let orphan = issue(TokenPayload::for_account("ghost"), &profiles.refresh).await;

        let use_case = RefreshTokenUseCase::new(Arc::new(store.accounts()), token_port(), profiles);
        assert!(use_case.refresh("garbage").await.unwrap().is_none());
        assert!(use_case.refresh(&access).await.unwrap().is_none());
        assert!(use_case.refresh(&orphan).await.unwrap().is_none());
    }
}
