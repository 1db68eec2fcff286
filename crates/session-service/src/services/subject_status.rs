//! Subject status hook consulted before a refresh mints new credentials.
//!
//! The user store lives upstream; embedders that can disable accounts plug
//! an implementation in via `SessionManager::with_subject_status`.

use crate::errors::SessionError;
use async_trait::async_trait;
use common::types::SubjectId;

#[async_trait]
pub trait SubjectStatus: Send + Sync {
    /// Whether `subject` may still obtain new credentials.
    async fn is_active(&self, subject: &SubjectId) -> Result<bool, SessionError>;
}

/// Treats every subject as active.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysActive;

#[async_trait]
impl SubjectStatus for AlwaysActive {
    async fn is_active(&self, _subject: &SubjectId) -> Result<bool, SessionError> {
        Ok(true)
    }
}
