use crate::config::Config;
use crate::db::Db;
use crate::directory::{OperatorContact, UserDirectory};
use crate::menu::{Button, Keyboard, MenuAction, Screen};
use crate::models::Applicant;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    ActiveUntil(DateTime<Utc>),
    Unlimited,
    Inactive { trial_claimed: bool },
}

/// Everything the welcome screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Welcome {
    pub first_name: String,
    pub is_admin: bool,
    pub subscription: SubscriptionState,
    /// `None` when login support is disabled
    pub logged_in: Option<bool>,
    /// Only resolved for users without a subscription
    pub operator_label: Option<String>,
}

pub fn welcome_screen(w: &Welcome) -> Screen {
    let mut text = format!("👋 Hello {}!\n\n", w.first_name);
    if w.is_admin {
        text.push_str("🔰 You are registered as an administrator.\n\n");
    }
    text.push_str("🤖 I am a bot for automatic posting in Telegram groups.\n\n");

    let mut keyboard = Keyboard::new()
        .row(Button::action("🔗 Referrals", MenuAction::Referral))
        .row(Button::action("🎁 Get a free trial (one day)", MenuAction::Trial));

    match &w.subscription {
        SubscriptionState::ActiveUntil(end) => {
            text.push_str(&format!(
                "✅ You have an active subscription until: {}\n\n",
                end.format("%Y-%m-%d")
            ));
            push_login_state(&mut text, w.logged_in);
        }
        SubscriptionState::Unlimited => {
            text.push_str("✅ You have an active subscription with no end date\n\n");
            push_login_state(&mut text, w.logged_in);
        }
        SubscriptionState::Inactive { trial_claimed } => {
            text.push_str("⚠️ You do not have an active subscription.\n\n");
            if *trial_claimed {
                text.push_str("You have already used the free trial.\n");
            }
            let label = w
                .operator_label
                .as_deref()
                .unwrap_or(crate::directory::OPERATOR_FALLBACK_LABEL);
            keyboard = keyboard.row(Button::action(
                format!("🔔 Request a subscription (contact {})", label),
                MenuAction::Subscription,
            ));
        }
    }

    keyboard = keyboard
        .row(Button::action("ℹ️ Usage information", MenuAction::UsageInfo))
        .row(Button::action("📝 Posting commands", MenuAction::PostingCommands));

    Screen::plain(text).with_keyboard(keyboard)
}

fn push_login_state(text: &mut String, logged_in: Option<bool>) {
    if logged_in == Some(true) {
        text.push_str("✅ You are logged in and can use the bot\n\n");
    } else {
        text.push_str("⚠️ You are not logged in and cannot use the bot\n\n");
    }
}

/// Get-or-create the user and gather their welcome state.
///
/// A new user arriving with a `ref_<id>` payload is credited to that referrer.
pub async fn load_welcome(
    cfg: &Config,
    db: &Db,
    directory: &dyn UserDirectory,
    applicant: &Applicant,
    payload: Option<&str>,
) -> Result<Welcome> {
    let user_id = applicant.user_id;
    let user = match db.get_user(user_id).await? {
        Some(u) => u,
        None => {
            db.create_user(applicant, cfg.is_admin(user_id)).await?;
            info!("created user {}", user_id);
            if let Some(referrer) = payload.and_then(parse_referral) {
                credit_referral(db, referrer, user_id).await;
            }
            db.get_user(user_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user {} missing after insert", user_id))?
        }
    };

    let now = Utc::now();
    let subscription = if user.subscription_unlimited {
        SubscriptionState::Unlimited
    } else {
        match user.subscription_end {
            Some(end) if user.has_active_subscription(now) => SubscriptionState::ActiveUntil(end),
            _ => SubscriptionState::Inactive {
                trial_claimed: user.trial_claimed,
            },
        }
    };

    let logged_in = if cfg.login_enabled() {
        Some(db.user_session(user_id).await?.is_some())
    } else {
        None
    };

    let operator_label = match subscription {
        SubscriptionState::Inactive { .. } => {
            Some(OperatorContact::resolve(directory, cfg.operator_id).await.label)
        }
        _ => None,
    };

    Ok(Welcome {
        first_name: applicant.first_name.clone().unwrap_or_default(),
        is_admin: user.is_admin || cfg.is_admin(user_id),
        subscription,
        logged_in,
        operator_label,
    })
}

/// `ref_<id>` start payload
pub fn parse_referral(payload: &str) -> Option<i64> {
    payload.trim().strip_prefix("ref_")?.parse().ok()
}

async fn credit_referral(db: &Db, referrer: i64, user_id: i64) {
    if referrer == user_id {
        return;
    }
    match db.get_user(referrer).await {
        Ok(Some(_)) => match db.record_referral(referrer, user_id).await {
            Ok(_) => info!("user {} joined via referral from {}", user_id, referrer),
            Err(e) => warn!("recording referral {} -> {} failed: {}", referrer, user_id, e),
        },
        Ok(None) => warn!("ignoring referral from unknown user {}", referrer),
        Err(e) => warn!("looking up referrer {} failed: {}", referrer, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Profile;
    use async_trait::async_trait;

    struct Operator;

    #[async_trait]
    impl UserDirectory for Operator {
        async fn resolve_profile(&self, _user_id: i64) -> Result<Profile> {
            Ok(Profile {
                display_name: Some("@op".into()),
                contact_link: Some("https://t.me/op".into()),
            })
        }
    }

    fn cfg() -> Config {
        Config::parse("token = \"t\"\noperator_id = 100\nadmins = [1]").unwrap()
    }

    fn applicant(user_id: i64) -> Applicant {
        Applicant {
            user_id,
            username: None,
            first_name: Some("Ann".into()),
            last_name: None,
        }
    }

    #[test]
    fn inactive_user_gets_request_button() {
        let screen = welcome_screen(&Welcome {
            first_name: "Ann".into(),
            is_admin: false,
            subscription: SubscriptionState::Inactive {
                trial_claimed: true,
            },
            logged_in: Some(false),
            operator_label: Some("@op".into()),
        });
        assert!(screen.text.starts_with("👋 Hello Ann!"));
        assert!(screen.text.contains("already used the free trial"));
        assert!(screen.keyboard.has_action(MenuAction::Subscription));
        let labels: Vec<_> = screen.keyboard.buttons().map(|b| b.label()).collect();
        assert_eq!(labels.len(), 5);
        assert!(labels[2].contains("@op"));
    }

    #[test]
    fn subscribed_user_sees_end_date_and_login_state() {
        let end = DateTime::parse_from_rfc3339("2030-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let screen = welcome_screen(&Welcome {
            first_name: "Ann".into(),
            is_admin: true,
            subscription: SubscriptionState::ActiveUntil(end),
            logged_in: Some(true),
            operator_label: None,
        });
        assert!(screen.text.contains("administrator"));
        assert!(screen.text.contains("until: 2030-01-02"));
        assert!(screen.text.contains("You are logged in"));
        assert!(!screen.keyboard.has_action(MenuAction::Subscription));
        assert_eq!(screen.keyboard.rows().len(), 4);
    }

    #[tokio::test]
    async fn first_start_creates_user_and_credits_referrer() {
        let db = Db::open_in_memory().await.unwrap();
        let cfg = cfg();
        load_welcome(&cfg, &db, &Operator, &applicant(50), None)
            .await
            .unwrap();

        let w = load_welcome(&cfg, &db, &Operator, &applicant(51), Some("ref_50"))
            .await
            .unwrap();
        assert_eq!(db.referral_count(50).await.unwrap(), 1);
        assert_eq!(
            w.subscription,
            SubscriptionState::Inactive {
                trial_claimed: false
            }
        );
        assert_eq!(w.operator_label.as_deref(), Some("@op"));
        assert_eq!(w.logged_in, Some(false));

        // returning users are not credited again
        load_welcome(&cfg, &db, &Operator, &applicant(51), Some("ref_50"))
            .await
            .unwrap();
        assert_eq!(db.referral_count(50).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn config_admin_is_flagged() {
        let db = Db::open_in_memory().await.unwrap();
        let w = load_welcome(&cfg(), &db, &Operator, &applicant(1), Some("ref_1"))
            .await
            .unwrap();
        assert!(w.is_admin);
        assert_eq!(db.referral_count(1).await.unwrap(), 0);
    }

    #[test]
    fn referral_payload_parsing() {
        assert_eq!(parse_referral("ref_42"), Some(42));
        assert_eq!(parse_referral(" ref_7 "), Some(7));
        assert_eq!(parse_referral("ref_"), None);
        assert_eq!(parse_referral("help"), None);
    }
}
