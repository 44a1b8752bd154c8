//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tg_autopost::db::{Db, StoreError, StoreResult};
use tg_autopost::directory::{Profile, UserDirectory};
use tg_autopost::intake::{RequestStore, SubscriptionRequestIntake};
use tg_autopost::menu::{Format, Screen};
use tg_autopost::models::{Applicant, RequestId, SubscriptionRequest};
use tg_autopost::notify::Notifier;

pub const OPERATOR_ID: i64 = 1000;

pub fn applicant(user_id: i64) -> Applicant {
    Applicant {
        user_id,
        username: Some(format!("user{}", user_id)),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
    }
}

// NOTIFIER

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Edit(Screen),
    Message { target: i64, screen: Screen },
}

/// Records every attempted delivery, optionally failing some of them
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_edits: bool,
    pub fail_markdown_edits: bool,
    pub fail_sends: bool,
    /// Reject sends carrying a link button, as Telegram does for private tg:// links
    pub fail_link_sends: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<Screen> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Edit(screen) => Some(screen),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<(i64, Screen)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { target, screen } => Some((target, screen)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn edit_current_message(&self, screen: &Screen) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Edit(screen.clone()));
        if self.fail_edits || (self.fail_markdown_edits && screen.format == Format::MarkdownV2) {
            return Err(anyhow!("message can't be edited"));
        }
        Ok(())
    }

    async fn send_message(&self, target_user_id: i64, screen: &Screen) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Message {
            target: target_user_id,
            screen: screen.clone(),
        });
        if self.fail_sends {
            return Err(anyhow!("bot was blocked by the user"));
        }
        if self.fail_link_sends && screen.keyboard.link().is_some() {
            return Err(anyhow!("Bad Request: BUTTON_USER_PRIVACY_RESTRICTED"));
        }
        Ok(())
    }
}

// DIRECTORY

pub struct StubDirectory {
    pub profile: Option<Profile>,
    pub calls: AtomicUsize,
}

impl StubDirectory {
    pub fn with_username(username: &str) -> Self {
        Self {
            profile: Some(Profile {
                display_name: Some(format!("@{}", username)),
                contact_link: Some(format!("https://t.me/{}", username)),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every lookup fails, as when the operator's chat is inaccessible
    pub fn unreachable() -> Self {
        Self {
            profile: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for StubDirectory {
    async fn resolve_profile(&self, _user_id: i64) -> Result<Profile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.profile
            .clone()
            .ok_or_else(|| anyhow!("Bad Request: chat not found"))
    }
}

// STORES

/// Delegates to a real `Db`, failing the selected operations
pub struct FaultyStore {
    pub db: Db,
    pub fail_find: bool,
    pub fail_insert: bool,
    /// Report no pending request, as a concurrent submission would see it
    pub blind_find: bool,
}

impl FaultyStore {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            fail_find: false,
            fail_insert: false,
            blind_find: false,
        }
    }
}

#[async_trait]
impl RequestStore for FaultyStore {
    async fn find_pending(&self, user_id: i64) -> StoreResult<Option<SubscriptionRequest>> {
        if self.fail_find {
            return Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        if self.blind_find {
            return Ok(None);
        }
        self.db.find_pending(user_id).await
    }

    async fn insert_pending(&self, applicant: &Applicant) -> StoreResult<RequestId> {
        if self.fail_insert {
            return Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        self.db.insert_pending(applicant).await
    }
}

pub fn intake(store: Arc<dyn RequestStore>, directory: Arc<dyn UserDirectory>) -> SubscriptionRequestIntake {
    SubscriptionRequestIntake::new(store, directory, OPERATOR_ID)
}
