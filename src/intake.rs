// src/intake.rs

//! Subscription-request intake.
//!
//! A user may hold at most one `pending` request. The store is re-read on every
//! call and is the only source of truth; the partial unique index in the schema
//! closes the window between the pending check and the insert, and a conflict
//! there is reported as [`IntakeResult::AlreadyPending`].
//!
//! After a request is recorded the requester gets two independent, best-effort
//! messages: an in-place acknowledgement and a separate operator-contact message.
//! A failed send is logged and never touches the stored request.
use crate::db::{StoreError, StoreResult};
use crate::directory::{OperatorContact, UserDirectory};
use crate::menu::{Button, Keyboard, MenuAction, Screen};
use crate::models::{Applicant, RequestId, SubscriptionRequest};
use crate::notify::Notifier;
use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;

pub const ALREADY_PENDING_TEXT: &str =
    "⚠️ You already have a pending subscription request. Please wait until it is processed.";
pub const RECORDED_TEXT: &str =
    "✅ Your subscription request has been sent to the administrator. You will be contacted soon.";
pub const FAILURE_TEXT: &str =
    "An error occurred while processing your subscription request. Please try again.";
pub const LINK_UNAVAILABLE_NOTE: &str = "(Could not retrieve the administrator's contact link)";

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn find_pending(&self, user_id: i64) -> StoreResult<Option<SubscriptionRequest>>;
    async fn insert_pending(&self, applicant: &Applicant) -> StoreResult<RequestId>;
}

#[derive(Debug)]
pub enum IntakeResult {
    AlreadyPending,
    Created(RequestId),
    StorageFailure(StoreError),
}

#[derive(Clone)]
pub struct SubscriptionRequestIntake {
    store: Arc<dyn RequestStore>,
    directory: Arc<dyn UserDirectory>,
    operator_id: i64,
}

impl SubscriptionRequestIntake {
    pub fn new(
        store: Arc<dyn RequestStore>,
        directory: Arc<dyn UserDirectory>,
        operator_id: i64,
    ) -> Self {
        Self {
            store,
            directory,
            operator_id,
        }
    }

    /// Record a request for `applicant` and tell them what happened through `notifier`
    pub async fn submit_request(
        &self,
        notifier: &dyn Notifier,
        applicant: &Applicant,
    ) -> IntakeResult {
        let user_id = applicant.user_id;
        let result = self.record(applicant).await;
        match &result {
            IntakeResult::AlreadyPending => {
                info!("user {} already has a pending subscription request", user_id);
                let screen = Screen::plain(ALREADY_PENDING_TEXT).with_keyboard(back_keyboard());
                if let Err(e) = notifier.edit_current_message(&screen).await {
                    warn!("pending notice to user {} failed: {}", user_id, e);
                }
            }
            IntakeResult::StorageFailure(e) => {
                error!("error recording subscription request for user {}: {}", user_id, e);
                if let Err(e) = notifier.edit_current_message(&Screen::plain(FAILURE_TEXT)).await {
                    warn!("failure notice to user {} failed: {}", user_id, e);
                }
            }
            IntakeResult::Created(id) => {
                info!("subscription request {} recorded for user {}", id, user_id);
                self.notify_created(notifier, user_id).await;
            }
        }
        result
    }

    async fn record(&self, applicant: &Applicant) -> IntakeResult {
        match self.store.find_pending(applicant.user_id).await {
            Ok(Some(_)) => return IntakeResult::AlreadyPending,
            Ok(None) => {}
            Err(e) => return IntakeResult::StorageFailure(e),
        }
        match self.store.insert_pending(applicant).await {
            Ok(id) => IntakeResult::Created(id),
            Err(StoreError::DuplicatePending { .. }) => IntakeResult::AlreadyPending,
            Err(e) => IntakeResult::StorageFailure(e),
        }
    }

    async fn notify_created(&self, notifier: &dyn Notifier, user_id: i64) {
        if let Err(e) = notifier.edit_current_message(&Screen::plain(RECORDED_TEXT)).await {
            error!("acknowledgement to user {} failed: {}", user_id, e);
        }

        let contact = OperatorContact::resolve(self.directory.as_ref(), self.operator_id).await;
        let Err(e) = notifier.send_message(user_id, &contact_screen(&contact)).await else {
            return;
        };
        if contact.link.is_none() {
            error!("operator contact message to user {} failed: {}", user_id, e);
            return;
        }
        // Telegram rejects tg://user links to operators with strict privacy settings
        warn!(
            "operator contact message to user {} failed, retrying without the link: {}",
            user_id, e
        );
        let unlinked = OperatorContact {
            label: contact.label,
            link: None,
        };
        if let Err(e) = notifier.send_message(user_id, &contact_screen(&unlinked)).await {
            error!("operator contact message to user {} failed: {}", user_id, e);
        }
    }
}

/// Operator contact affordance: a link button when available, otherwise a note
pub fn contact_screen(contact: &OperatorContact) -> Screen {
    let mut text = format!(
        "Please contact the administrator {} to get a subscription.",
        contact.label
    );
    let mut keyboard = Keyboard::new();
    match &contact.link {
        Some(link) => {
            keyboard = keyboard.row(Button::link(format!("👇💬 Contact {}", contact.label), link));
        }
        None => {
            text.push_str("\n\n");
            text.push_str(LINK_UNAVAILABLE_NOTE);
        }
    }
    Screen::plain(text).with_keyboard(keyboard.row(Button::action("🔙 Back", MenuAction::Back)))
}

fn back_keyboard() -> Keyboard {
    Keyboard::new().row(Button::action("🔙 Back", MenuAction::Back))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_screen_with_link_has_link_button() {
        let screen = contact_screen(&OperatorContact {
            label: "@op".into(),
            link: Some("https://t.me/op".into()),
        });
        assert!(screen.text.contains("@op"));
        assert!(!screen.text.contains(LINK_UNAVAILABLE_NOTE));
        assert_eq!(screen.keyboard.link(), Some("https://t.me/op"));
        assert!(screen.keyboard.has_action(MenuAction::Back));
    }

    #[test]
    fn contact_screen_without_link_adds_note() {
        let screen = contact_screen(&OperatorContact::fallback());
        assert!(screen.text.contains("the administrator"));
        assert!(screen.text.ends_with(LINK_UNAVAILABLE_NOTE));
        assert_eq!(screen.keyboard.link(), None);
        assert_eq!(screen.keyboard.rows().len(), 1);
    }
}
