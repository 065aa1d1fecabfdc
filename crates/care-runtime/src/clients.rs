//! # Bridge Clients
//!
//! The three requesters, with call-site shaped methods for the services that
//! use them.

use care_bridge::{
    AcceptanceQuery, AnnouncementOwner, ApplicationVerification, BridgeConfig, BridgeError,
    Requester, UserExists,
};
use shared_bus::Transport;
use std::sync::Arc;

/// One requester per call type, sharing a transport.
pub struct BridgeClients {
    pub user_exists: Requester<UserExists>,
    pub announcement_owner: Requester<AnnouncementOwner>,
    pub application_verification: Requester<ApplicationVerification>,
}

impl BridgeClients {
    /// Create the requesters and start their reply listeners.
    pub fn connect(transport: Arc<dyn Transport>, config: &BridgeConfig) -> Result<Self, BridgeError> {
        Ok(Self {
            user_exists: Requester::new(transport.clone(), config.user_exists.clone())?,
            announcement_owner: Requester::new(
                transport.clone(),
                config.announcement_owner.clone(),
            )?,
            application_verification: Requester::new(
                transport,
                config.application_verification.clone(),
            )?,
        })
    }

    /// Whether a chat recipient exists. `true` when the user service is silent.
    pub async fn user_exists(&self, username: &str) -> Result<bool, BridgeError> {
        self.user_exists.request(username.to_string()).await
    }

    /// Owner of an announcement, `None` if unknown or unanswered.
    pub async fn announcement_owner(&self, announcement_id: i64) -> Result<Option<String>, BridgeError> {
        self.announcement_owner.request(announcement_id).await
    }

    /// Whether `username` has an accepted application for the announcement.
    /// `false` when the application service is silent.
    pub async fn has_accepted_application(
        &self,
        username: &str,
        announcement_id: i64,
    ) -> Result<bool, BridgeError> {
        self.application_verification
            .request(AcceptanceQuery::new(username, announcement_id))
            .await
    }

    /// Calls currently waiting, across all three call types.
    pub fn pending_calls(&self) -> usize {
        self.user_exists.pending_count()
            + self.announcement_owner.pending_count()
            + self.application_verification.pending_count()
    }
}
