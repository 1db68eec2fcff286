//! Session Manager: issuance, validation, rotation and revocation of
//! access/refresh credential pairs.
//!
//! Session states: `Unissued -> Live -> (Expired | Revoked)`. The terminal
//! states are indistinguishable in the store (both are absence).
//!
//! The manager never retries. Store failures come back immediately as
//! `SessionError::StoreUnavailable` and the caller decides what to do.
//!
//! The one ordering invariant lives in [`SessionManager::refresh`]: the old
//! refresh credential is deleted before anything new is issued, and a
//! delete count of zero is a failure. Two concurrent refreshes with the same
//! token therefore cannot both succeed.

use crate::errors::SessionError;
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{
    record_refresh, record_revocation, record_token_issued, record_validation,
};
use crate::observability::ErrorCategory;
use crate::services::subject_status::{AlwaysActive, SubjectStatus};
use crate::store::CredentialStore;
use crate::token::{AccessClaims, RefreshClaims, TokenCodec, TokenError};
use common::types::{CredentialId, SubjectId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default long-lived access token lifetime (372 days).
pub const DEFAULT_LONG_LIVED_TTL: Duration = Duration::from_secs(24 * 31 * 12 * 60 * 60);

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub long_lived_ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            long_lived_ttl: DEFAULT_LONG_LIVED_TTL,
        }
    }
}

/// A freshly issued access/refresh pair.
///
/// The two credentials share the subject but have independent ids and are
/// revoked independently. Token strings are redacted from `Debug`.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_credential: CredentialId,
    pub refresh_credential: CredentialId,
    /// Unix seconds
    pub access_expires_at: i64,
    /// Unix seconds
    pub refresh_expires_at: i64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_credential", &self.access_credential)
            .field("refresh_credential", &self.refresh_credential)
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// A single issued access token (long-lived tokens have no refresh sibling).
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub credential_id: CredentialId,
    /// Unix seconds
    pub expires_at: i64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("credential_id", &self.credential_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of a successful access token validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    pub subject_id: SubjectId,
    /// Access credential the request presented.
    pub credential_id: CredentialId,
}

/// Orchestrates the Token Codec and the Credential Store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    policy: SessionPolicy,
    subject_status: Arc<dyn SubjectStatus>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec, policy: SessionPolicy) -> Self {
        Self {
            store,
            codec,
            policy,
            subject_status: Arc::new(AlwaysActive),
        }
    }

    /// Replace the subject status hook consulted by `refresh`.
    pub fn with_subject_status(mut self, subject_status: Arc<dyn SubjectStatus>) -> Self {
        self.subject_status = subject_status;
        self
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Mint an access/refresh pair for `subject` and register both
    /// credentials in the store.
    ///
    /// # Errors
    ///
    /// - `InvalidSubject` for a blank subject
    /// - `Encoding` if signing fails
    /// - `StoreUnavailable` if either store write fails. The whole issuance
    ///   has failed; an access credential written before a failed refresh
    ///   write is left to expire.
    #[instrument(skip_all)]
    pub async fn issue(&self, subject: &SubjectId) -> Result<TokenPair, SessionError> {
        if subject.is_blank() {
            return Err(SessionError::InvalidSubject);
        }

        let now = now_unix();
        let access_credential = CredentialId::new();
        let refresh_credential = CredentialId::new();
        let access_expires_at = expires_at(now, self.policy.access_ttl);
        let refresh_expires_at = expires_at(now, self.policy.refresh_ttl);

        let access_token = self.codec.sign_access(&AccessClaims::new(
            access_credential,
            subject.clone(),
            now,
            access_expires_at,
        ))?;
        let refresh_token = self.codec.sign_refresh(&RefreshClaims::new(
            refresh_credential,
            subject.clone(),
            now,
            refresh_expires_at,
        ))?;

        self.register(access_credential, subject, self.policy.access_ttl, "access")
            .await?;
        self.register(refresh_credential, subject, self.policy.refresh_ttl, "refresh")
            .await?;

        record_token_issued("access");
        record_token_issued("refresh");

        info!(
            target: "session.manager",
            subject = %hash_for_correlation(subject.as_str()),
            access_credential = %access_credential,
            refresh_credential = %refresh_credential,
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_credential,
            refresh_credential,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Mint a single long-lived access token for `subject`.
    ///
    /// It is stored and validated like any access credential, so `validate`
    /// accepts it and `revoke` ends it.
    #[instrument(skip_all)]
    pub async fn issue_long_lived(&self, subject: &SubjectId) -> Result<IssuedToken, SessionError> {
        if subject.is_blank() {
            return Err(SessionError::InvalidSubject);
        }

        let now = now_unix();
        let credential_id = CredentialId::new();
        let expires_at = expires_at(now, self.policy.long_lived_ttl);

        let token = self.codec.sign_access(&AccessClaims::new(
            credential_id,
            subject.clone(),
            now,
            expires_at,
        ))?;

        self.register(credential_id, subject, self.policy.long_lived_ttl, "long_lived")
            .await?;

        record_token_issued("long_lived");
        info!(
            target: "session.manager",
            subject = %hash_for_correlation(subject.as_str()),
            credential = %credential_id,
            "Issued long-lived access token"
        );

        Ok(IssuedToken {
            token,
            credential_id,
            expires_at,
        })
    }

    /// Validate an access token and return its subject.
    ///
    /// # Errors
    ///
    /// - `MalformedToken`, `InvalidSignature`, `Expired` from the codec
    /// - `Unauthorized` if the credential is not live or the store entry
    ///   points at a different subject
    /// - `StoreUnavailable` if the lookup fails
    pub async fn validate(&self, access_token: &str) -> Result<SubjectId, SessionError> {
        self.authenticate_token(access_token)
            .await
            .map(|authenticated| authenticated.subject_id)
    }

    /// Like [`SessionManager::validate`], also returning the credential id.
    #[instrument(skip_all)]
    pub async fn authenticate_token(
        &self,
        access_token: &str,
    ) -> Result<AuthenticatedSubject, SessionError> {
        let result = self.check_access(access_token).await;
        match &result {
            Ok(_) => record_validation("success", None),
            Err(e) => record_validation("error", Some(ErrorCategory::from(e).as_str())),
        }
        result
    }

    async fn check_access(&self, access_token: &str) -> Result<AuthenticatedSubject, SessionError> {
        let claims = self.codec.verify_access(access_token)?;

        let stored = self.store.get(claims.access_uuid).await?.ok_or_else(|| {
            debug!(
                target: "session.manager",
                credential = %claims.access_uuid,
                "Access credential is not live"
            );
            SessionError::Unauthorized
        })?;

        if stored != claims.user_id {
            warn!(
                target: "session.manager",
                credential = %claims.access_uuid,
                claimed = %hash_for_correlation(claims.user_id.as_str()),
                stored = %hash_for_correlation(stored.as_str()),
                "Store entry subject does not match token subject"
            );
            return Err(SessionError::Unauthorized);
        }

        Ok(AuthenticatedSubject {
            subject_id: stored,
            credential_id: claims.access_uuid,
        })
    }

    /// Redeem a refresh token for a new pair. Single use.
    ///
    /// # Errors
    ///
    /// - codec errors for the refresh token
    /// - `Unauthorized` if the credential is not live, was already redeemed,
    ///   belongs to another subject, or the subject is no longer active
    /// - `StoreUnavailable` / `Encoding` from the follow-up issuance
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let result = self.rotate(refresh_token).await;
        record_refresh(if result.is_ok() { "success" } else { "error" });
        result
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = self.codec.verify_refresh(refresh_token)?;
        let credential = claims.refresh_uuid;

        let stored = self.store.get(credential).await?.ok_or_else(|| {
            debug!(target: "session.manager", credential = %credential, "Refresh credential is not live");
            SessionError::Unauthorized
        })?;

        if stored != claims.user_id {
            warn!(
                target: "session.manager",
                credential = %credential,
                "Store entry subject does not match refresh token subject"
            );
            return Err(SessionError::Unauthorized);
        }

        // Consume the old credential strictly before issuing anything new.
        let deleted = self.store.delete(credential).await?;
        if deleted == 0 {
            debug!(
                target: "session.manager",
                credential = %credential,
                "Refresh credential already redeemed"
            );
            return Err(SessionError::Unauthorized);
        }

        if !self.subject_status.is_active(&claims.user_id).await? {
            info!(
                target: "session.manager",
                subject = %hash_for_correlation(claims.user_id.as_str()),
                "Refresh refused: subject is no longer active"
            );
            return Err(SessionError::Unauthorized);
        }

        self.issue(&claims.user_id).await
    }

    /// Revoke the credential behind an access or refresh token.
    ///
    /// The token is fully verified first; an unverified credential id is
    /// never trusted. Only that one credential is deleted.
    ///
    /// # Errors
    ///
    /// - codec errors if the token verifies as neither kind
    /// - `StoreUnavailable` if the delete fails
    #[instrument(skip_all)]
    pub async fn revoke(&self, token: &str) -> Result<u64, SessionError> {
        let result = self.revoke_verified(token).await;
        record_revocation(if result.is_ok() { "success" } else { "error" });
        result
    }

    async fn revoke_verified(&self, token: &str) -> Result<u64, SessionError> {
        let credential = match self.codec.verify_access(token) {
            Ok(claims) => claims.access_uuid,
            // Not signed with the access secret: try the refresh secret.
            Err(TokenError::InvalidSignature) => self.codec.verify_refresh(token)?.refresh_uuid,
            Err(e) => return Err(e.into()),
        };

        let deleted = self.store.delete(credential).await?;
        debug!(
            target: "session.manager",
            credential = %credential,
            deleted,
            "Revoked credential"
        );
        Ok(deleted)
    }

    /// End an authenticated session: delete the presented access credential
    /// and, if given, the refresh token's credential.
    ///
    /// # Errors
    ///
    /// - codec errors for the refresh token
    /// - `Unauthorized` if the refresh token belongs to another subject
    /// - `StoreUnavailable` if a delete fails
    #[instrument(skip_all)]
    pub async fn logout(
        &self,
        session: &AuthenticatedSubject,
        refresh_token: Option<&str>,
    ) -> Result<u64, SessionError> {
        let refresh_credential = match refresh_token {
            Some(token) => {
                let claims = self.codec.verify_refresh(token)?;
                if claims.user_id != session.subject_id {
                    warn!(
                        target: "session.manager",
                        "Logout refused: refresh token belongs to another subject"
                    );
                    return Err(SessionError::Unauthorized);
                }
                Some(claims.refresh_uuid)
            }
            None => None,
        };

        let mut deleted = self.store.delete(session.credential_id).await?;
        record_revocation("success");
        if let Some(credential) = refresh_credential {
            deleted += self.store.delete(credential).await?;
            record_revocation("success");
        }

        info!(
            target: "session.manager",
            subject = %hash_for_correlation(session.subject_id.as_str()),
            deleted,
            "Session ended"
        );
        Ok(deleted)
    }

    async fn register(
        &self,
        credential: CredentialId,
        subject: &SubjectId,
        ttl: Duration,
        kind: &'static str,
    ) -> Result<(), SessionError> {
        self.store.put(credential, subject, ttl).await.map_err(|e| {
            error!(
                target: "session.manager",
                kind,
                credential = %credential,
                subject = %hash_for_correlation(subject.as_str()),
                error = %e,
                "Failed to register credential; issuance failed"
            );
            SessionError::from(e)
        })
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

fn expires_at(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}
