//! # Responder Handlers
//!
//! Business logic behind the three responders: each answers from one store.

use crate::stores::Stores;
use async_trait::async_trait;
use care_bridge::{
    AcceptanceQuery, AnnouncementOwner, ApplicationVerification, HandlerError, RequestHandler,
    UserExists,
};
use std::sync::Arc;
use tracing::debug;

/// Answers "does this user exist?" from the user directory.
pub struct UserExistsHandler {
    stores: Arc<Stores>,
}

impl UserExistsHandler {
    pub fn new(stores: Arc<Stores>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl RequestHandler<UserExists> for UserExistsHandler {
    async fn handle(&self, username: String) -> Result<bool, HandlerError> {
        if username.trim().is_empty() {
            return Err(HandlerError::Failed("empty username".into()));
        }
        let exists = self.stores.users.exists(&username);
        debug!(username = %username, exists, "User existence checked");
        Ok(exists)
    }
}

/// Answers "who owns this announcement?" from the announcement book.
pub struct AnnouncementOwnerHandler {
    stores: Arc<Stores>,
}

impl AnnouncementOwnerHandler {
    pub fn new(stores: Arc<Stores>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl RequestHandler<AnnouncementOwner> for AnnouncementOwnerHandler {
    async fn handle(&self, announcement_id: i64) -> Result<Option<String>, HandlerError> {
        Ok(self.stores.announcements.owner_of(announcement_id))
    }
}

/// Answers "was this user's application accepted?" from the application ledger.
pub struct ApplicationVerificationHandler {
    stores: Arc<Stores>,
}

impl ApplicationVerificationHandler {
    pub fn new(stores: Arc<Stores>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl RequestHandler<ApplicationVerification> for ApplicationVerificationHandler {
    async fn handle(&self, query: AcceptanceQuery) -> Result<bool, HandlerError> {
        Ok(self
            .stores
            .applications
            .is_accepted(&query.username, query.announcement_id))
    }
}
