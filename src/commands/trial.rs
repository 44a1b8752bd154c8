use crate::config::Config;
use crate::db::{Db, StoreResult};
use crate::directory::{OperatorContact, UserDirectory};
use crate::intake::LINK_UNAVAILABLE_NOTE;
use crate::menu::{Button, Format, Keyboard, MenuAction, Screen};
use crate::models::Applicant;
use crate::notify::Notifier;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info};
use teloxide::utils::markdown::escape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    Granted(DateTime<Utc>),
    AlreadyClaimed,
}

/// Grant the trial once per user, on top of any time already paid for
pub async fn claim_trial(db: &Db, applicant: &Applicant, days: i64) -> StoreResult<TrialOutcome> {
    db.create_user(applicant, false).await?;
    Ok(match db.claim_trial(applicant.user_id, days).await? {
        Some(end) => TrialOutcome::Granted(end),
        None => TrialOutcome::AlreadyClaimed,
    })
}

pub fn trial_granted_screen(days: i64) -> Screen {
    let period = if days == 1 {
        "one day".to_string()
    } else {
        format!("{} days", days)
    };
    Screen::plain(format!(
        "✅ Your free trial for {} is active! Enjoy the bot's features.\n\n",
        period
    ))
    .with_keyboard(Keyboard::new().row(Button::action("🔙 Back", MenuAction::Back)))
}

/// `format` picks between the MarkdownV2 rendering and its plain-text fallback
pub fn trial_claimed_screen(contact: &OperatorContact, format: Format) -> Screen {
    let mut keyboard = Keyboard::new();
    if let Some(link) = &contact.link {
        keyboard = keyboard.row(Button::link(format!("👇💬 Contact {}", contact.label), link));
    }
    keyboard = keyboard.row(Button::action("🔙 Back", MenuAction::Back));

    let headline = "⚠️ You have already enjoyed your free trial! We hope you liked it.";
    let body = "To keep using all of the bot's features, please request a paid subscription.";
    let mut text = match format {
        Format::MarkdownV2 => format!(
            "*{}*\n\n{}\n\n{}",
            escape(headline),
            escape(body),
            escape("👇 Press the button below to contact the administrator.")
        ),
        Format::Plain => format!("{}\n\n{}\n\n👇 Contact {}.", headline, body, contact.label),
    };
    if contact.link.is_none() {
        text.push_str("\n\n");
        match format {
            Format::MarkdownV2 => text.push_str(&escape(LINK_UNAVAILABLE_NOTE)),
            Format::Plain => text.push_str(LINK_UNAVAILABLE_NOTE),
        }
    }
    Screen {
        text,
        keyboard,
        format,
    }
}

pub async fn handle_trial(
    cfg: &Config,
    db: &Db,
    directory: &dyn UserDirectory,
    notifier: &dyn Notifier,
    applicant: &Applicant,
) -> Result<()> {
    match claim_trial(db, applicant, cfg.trial_days()).await? {
        TrialOutcome::Granted(end) => {
            info!("trial granted to user {} until {}", applicant.user_id, end);
            notifier
                .edit_current_message(&trial_granted_screen(cfg.trial_days()))
                .await?;
        }
        TrialOutcome::AlreadyClaimed => {
            let contact = OperatorContact::resolve(directory, cfg.operator_id).await;
            let formatted = trial_claimed_screen(&contact, Format::MarkdownV2);
            if let Err(e) = notifier.edit_current_message(&formatted).await {
                error!(
                    "formatted trial notice to user {} failed, retrying as plain text: {}",
                    applicant.user_id, e
                );
                notifier
                    .edit_current_message(&trial_claimed_screen(&contact, Format::Plain))
                    .await?;
            }
        }
    }
    Ok(())
}
