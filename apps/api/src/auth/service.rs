//! Token lifecycle: issued → active (revalidated on use) → expired | revoked.
//!
//! A token is valid only while its store record exists and has not
//! expired. Signature checks run first and never touch the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::errors::AuthError;
use crate::auth::jwt::{Claims, TokenSigner, TokenSubject};
use crate::auth::store::TokenStore;
use crate::models::token::{AccessTokenRecord, TokenStats};

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Revocation {
    Revoked,
    AlreadyRevoked,
}

#[derive(Clone)]
pub struct TokenService {
    signer: TokenSigner,
    store: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl TokenService {
    /// `ttl` must be positive so every record expires after it was created.
    pub fn new(signer: TokenSigner, store: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self {
            signer,
            store,
            ttl: ttl.max(Duration::seconds(1)),
        }
    }

    /// Mints a signed token and persists its store record.
    pub async fn issue(&self, subject: &TokenSubject) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims::new(subject, now, expires_at);
        let token = self.signer.sign(&claims)?;

        self.store
            .insert(&AccessTokenRecord {
                token: token.clone(),
                user_id: subject.user_id,
                username: subject.username.clone(),
                role: subject.role,
                created_at: now,
                expires_at,
                last_used_at: None,
            })
            .await?;

        info!("Issued access token for user {} (jti {})", subject.user_id, claims.jti);
        Ok(IssuedToken {
            access_token: token,
            token_type: "bearer",
            expires_at,
        })
    }

    /// Signature first, then the store record, then the record's expiry.
    ///
    /// An expired record is deleted on sight and triggers an inline sweep.
    /// `last_used_at` bookkeeping is best-effort.
    pub async fn validate(&self, token: &str) -> Result<AccessTokenRecord, AuthError> {
        self.signer.verify(token)?;

        let mut record = self.store.find(token).await?.ok_or(AuthError::Revoked)?;

        let now = Utc::now();
        if record.is_expired_at(now) {
            if let Err(e) = self.store.delete(token).await {
                warn!("Failed to delete expired token record: {e:#}");
            }
            match self.store.delete_expired(now).await {
                Ok(0) => {}
                Ok(n) => info!("Inline sweep removed {n} more expired tokens"),
                Err(e) => warn!("Inline token sweep failed: {e:#}"),
            }
            return Err(AuthError::Expired);
        }

        match self.store.touch(token, now).await {
            Ok(()) => record.last_used_at = Some(now),
            Err(e) => warn!("Failed to record token use: {e:#}"),
        }
        Ok(record)
    }

    /// Swaps a live `token` for a fresh one carrying the same identity.
    ///
    /// The old token must pass `validate`, so revoked and expired tokens
    /// stay terminal. A record deleted between validation and the swap is
    /// tolerated.
    pub async fn refresh(&self, token: &str) -> Result<IssuedToken, AuthError> {
        let record = self.validate(token).await?;
        if !self.store.delete(token).await? {
            info!("Token for user {} vanished during refresh", record.user_id);
        }
        self.issue(&TokenSubject {
            user_id: record.user_id,
            username: record.username,
            role: record.role,
        })
        .await
    }

    /// Deletes the record. Revoking an absent token is not an error.
    pub async fn revoke(&self, token: &str) -> Result<Revocation, AuthError> {
        if self.store.delete(token).await? {
            info!("Revoked access token");
            Ok(Revocation::Revoked)
        } else {
            Ok(Revocation::AlreadyRevoked)
        }
    }

    /// Deletes every expired record; returns how many were removed.
    pub async fn sweep(&self) -> Result<u64, AuthError> {
        let deleted = self.store.delete_expired(Utc::now()).await?;
        if deleted > 0 {
            info!("Cleaned up {deleted} expired access tokens");
        }
        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<TokenStats, AuthError> {
        Ok(self.store.stats(Utc::now()).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use crate::auth::store::memory::MemoryTokenStore;
    use uuid::Uuid;

    pub(crate) fn service_with(store: Arc<MemoryTokenStore>) -> TokenService {
        TokenService::new(TokenSigner::new("test-secret"), store, Duration::minutes(30))
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            username: "ada@example.com".into(),
            role: Role::Viewer,
        }
    }

    #[tokio::test]
    async fn test_issue_then_validate() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());

        let issued = service.issue(&subject()).await.unwrap();
        assert!(store.contains(&issued.access_token));

        let record = service.validate(&issued.access_token).await.unwrap();
        assert_eq!(record.username, "ada@example.com");
        assert!(record.expires_at > record.created_at);
        assert!(store.get(&issued.access_token).unwrap().last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_expired_token_fails_and_record_is_deleted() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let issued = service.issue(&subject()).await.unwrap();

        store.set_expiry(&issued.access_token, Utc::now() - Duration::seconds(1));

        let err = service.validate(&issued.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert!(!store.contains(&issued.access_token));
    }

    #[tokio::test]
    async fn test_expiry_miss_sweeps_other_expired_records() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let a = service.issue(&subject()).await.unwrap();
        let b = service.issue(&subject()).await.unwrap();
        let live = service.issue(&subject()).await.unwrap();
        let past = Utc::now() - Duration::minutes(1);
        store.set_expiry(&a.access_token, past);
        store.set_expiry(&b.access_token, past);

        assert!(service.validate(&a.access_token).await.is_err());
        assert!(!store.contains(&b.access_token));
        assert!(store.contains(&live.access_token));
    }

    #[tokio::test]
    async fn test_bad_signature_fails_before_store_lookup() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let err = service.validate("garbage.token.value").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));

        let foreign = TokenService::new(
            TokenSigner::new("other-secret"),
            Arc::new(MemoryTokenStore::default()),
            Duration::minutes(5),
        )
        .issue(&subject())
        .await
        .unwrap();
        let err = service.validate(&foreign.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn test_signed_but_unknown_token_is_revoked() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let issued = service.issue(&subject()).await.unwrap();
        store.delete(&issued.access_token).await.unwrap();

        let err = service.validate(&issued.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Revoked));
    }

    #[tokio::test]
    async fn test_refresh_invalidates_old_token() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let s = subject();
        let old = service.issue(&s).await.unwrap();

        let new = service.refresh(&old.access_token).await.unwrap();
        assert_ne!(new.access_token, old.access_token);
        assert!(matches!(
            service.validate(&old.access_token).await,
            Err(AuthError::Revoked)
        ));
        let record = service.validate(&new.access_token).await.unwrap();
        assert_eq!(record.user_id, s.user_id);
        assert_eq!(record.role, s.role);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_token() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let old = service.issue(&subject()).await.unwrap();
        service.revoke(&old.access_token).await.unwrap();

        let err = service.refresh(&old.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Revoked));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let old = service.issue(&subject()).await.unwrap();
        store.set_expiry(&old.access_token, Utc::now() - Duration::seconds(1));

        let err = service.refresh(&old.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert!(!store.contains(&old.access_token));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_refresh_token_only_once() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let old = service.issue(&subject()).await.unwrap();

        service.refresh(&old.access_token).await.unwrap();
        let err = service.refresh(&old.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Revoked));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_twice_reports_already_revoked() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let issued = service.issue(&subject()).await.unwrap();

        assert_eq!(
            service.revoke(&issued.access_token).await.unwrap(),
            Revocation::Revoked
        );
        assert_eq!(
            service.revoke(&issued.access_token).await.unwrap(),
            Revocation::AlreadyRevoked
        );
        assert!(service.validate(&issued.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_sweep_and_stats() {
        let store = Arc::new(MemoryTokenStore::default());
        let service = service_with(store.clone());
        let expired = service.issue(&subject()).await.unwrap();
        service.issue(&subject()).await.unwrap();
        store.set_expiry(&expired.access_token, Utc::now() - Duration::hours(1));

        let stats = service.stats().await.unwrap();
        assert_eq!(
            stats,
            TokenStats {
                total_tokens: 2,
                expired_tokens: 1,
                active_tokens: 1
            }
        );

        assert_eq!(service.sweep().await.unwrap(), 1);
        assert_eq!(service.sweep().await.unwrap(), 0);
        assert_eq!(service.stats().await.unwrap().total_tokens, 1);
    }

    #[tokio::test]
    async fn test_touch_failure_does_not_fail_validation() {
        let store = Arc::new(MemoryTokenStore::failing_touch());
        let service = service_with(store.clone());
        let issued = service.issue(&subject()).await.unwrap();

        let record = service.validate(&issued.access_token).await.unwrap();
        assert!(record.last_used_at.is_none());
    }
}
