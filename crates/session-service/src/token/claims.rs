//! Typed claim sets carried by session tokens.

use common::types::{CredentialId, SubjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims every session token carries, regardless of kind.
pub trait TokenClaims {
    /// Store key of the credential this token represents.
    fn credential_id(&self) -> CredentialId;
    /// Subject the token was issued to.
    fn subject(&self) -> &SubjectId;
    /// Expiry, unix seconds.
    fn expires_at(&self) -> i64;
    /// Issued-at, unix seconds.
    fn issued_at(&self) -> i64;
}

/// Access token claims.
///
/// Wire form: `{"authorized":true,"access_uuid":..,"user_id":..,"exp":..,"iat":..}`.
/// The `user_id` field is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub authorized: bool,
    pub access_uuid: CredentialId,
    pub user_id: SubjectId,
    pub exp: i64,
    pub iat: i64,
}

impl AccessClaims {
    /// Authorized access claims for a fresh credential.
    pub fn new(access_uuid: CredentialId, user_id: SubjectId, iat: i64, exp: i64) -> Self {
        Self {
            authorized: true,
            access_uuid,
            user_id,
            exp,
            iat,
        }
    }
}

impl TokenClaims for AccessClaims {
    fn credential_id(&self) -> CredentialId {
        self.access_uuid
    }

    fn subject(&self) -> &SubjectId {
        &self.user_id
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }

    fn issued_at(&self) -> i64 {
        self.iat
    }
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("authorized", &self.authorized)
            .field("access_uuid", &self.access_uuid)
            .field("user_id", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

/// Refresh token claims.
///
/// Wire form: `{"refresh_uuid":..,"user_id":..,"exp":..,"iat":..}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub refresh_uuid: CredentialId,
    pub user_id: SubjectId,
    pub exp: i64,
    pub iat: i64,
}

impl RefreshClaims {
    pub fn new(refresh_uuid: CredentialId, user_id: SubjectId, iat: i64, exp: i64) -> Self {
        Self {
            refresh_uuid,
            user_id,
            exp,
            iat,
        }
    }
}

impl TokenClaims for RefreshClaims {
    fn credential_id(&self) -> CredentialId {
        self.refresh_uuid
    }

    fn subject(&self) -> &SubjectId {
        &self.user_id
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }

    fn issued_at(&self) -> i64 {
        self.iat
    }
}

impl fmt::Debug for RefreshClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshClaims")
            .field("refresh_uuid", &self.refresh_uuid)
            .field("user_id", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}
