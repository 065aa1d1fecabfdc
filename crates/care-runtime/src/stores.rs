//! # Lookup Stores
//!
//! In-memory stand-ins for the user, announcement and application tables the
//! responders answer from.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Registered usernames.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashSet<String>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, username: impl Into<String>) {
        self.users.write().insert(username.into());
    }

    pub fn remove(&self, username: &str) -> bool {
        self.users.write().remove(username)
    }

    pub fn exists(&self, username: &str) -> bool {
        self.users.read().contains(username)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

/// Owner of each announcement.
#[derive(Debug, Default)]
pub struct AnnouncementBook {
    owners: RwLock<HashMap<i64, String>>,
}

impl AnnouncementBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, announcement_id: i64, owner: impl Into<String>) {
        self.owners.write().insert(announcement_id, owner.into());
    }

    pub fn owner_of(&self, announcement_id: i64) -> Option<String> {
        self.owners.read().get(&announcement_id).cloned()
    }
}

/// Applications accepted per announcement.
#[derive(Debug, Default)]
pub struct ApplicationLedger {
    accepted: RwLock<HashSet<(String, i64)>>,
}

impl ApplicationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&self, username: impl Into<String>, announcement_id: i64) {
        self.accepted
            .write()
            .insert((username.into(), announcement_id));
    }

    pub fn is_accepted(&self, username: &str, announcement_id: i64) -> bool {
        self.accepted
            .read()
            .contains(&(username.to_string(), announcement_id))
    }
}

/// The three stores a runtime answers from.
#[derive(Debug, Default)]
pub struct Stores {
    pub users: UserDirectory,
    pub announcements: AnnouncementBook,
    pub applications: ApplicationLedger,
}

impl Stores {
    /// Small fixture data set used by the binary and its self-check.
    pub fn seeded() -> Self {
        let stores = Self::default();
        stores.users.add("alice");
        stores.users.add("bob");
        stores.announcements.publish(1, "alice");
        stores.applications.accept("bob", 1);
        stores
    }
}
