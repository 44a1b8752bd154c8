// src/cmd.rs

//! Central command and callback dispatcher
use crate::commands::{api_info, help, referral, start, trial};
use crate::config::Config;
use crate::db::Db;
use crate::directory::UserDirectory;
use crate::intake::SubscriptionRequestIntake;
use crate::menu::{MenuAction, Screen};
use crate::models::Applicant;
use crate::notify::{Notifier, TelegramNotifier};
use log::{error, warn};
use std::sync::Arc;
use teloxide::types::{ChatId, User};
use teloxide::Bot;
use teloxide::{dptree, macros::BotCommands, prelude::*};

const GENERIC_FAILURE_TEXT: &str = "An error occurred. Please try again later.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start(String),
    #[command(description = "how to obtain an API ID and API Hash")]
    ApiInfo,
}

pub async fn cmd_dispatch(
    bot: Bot,
    cfg: Config,
    db: Arc<Db>,
    directory: Arc<dyn UserDirectory>,
    intake: SubscriptionRequestIntake,
) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_cmd),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![bot, cfg, db, directory, intake])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

pub fn applicant_from(user: &User) -> Applicant {
    Applicant {
        user_id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    }
}

async fn handle_cmd(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cfg: Config,
    db: Arc<Db>,
    directory: Arc<dyn UserDirectory>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let applicant = match msg.from.as_ref() {
        Some(u) => applicant_from(u),
        None => return Ok(()),
    };
    let notifier = TelegramNotifier::new(bot, chat_id, None);

    let screen = match cmd {
        Command::Start(payload) => {
            let payload = Some(payload.as_str()).filter(|p| !p.trim().is_empty());
            match start::load_welcome(&cfg, &db, directory.as_ref(), &applicant, payload).await {
                Ok(w) => start::welcome_screen(&w),
                Err(e) => {
                    error!("/start failed for user {}: {}", applicant.user_id, e);
                    Screen::plain(GENERIC_FAILURE_TEXT)
                }
            }
        }
        Command::ApiInfo => api_info::api_info_screen(cfg.login_enabled()),
    };

    if let Err(e) = notifier.send_message(chat_id.0, &screen).await {
        error!("reply to user {} failed: {}", applicant.user_id, e);
    }
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: Config,
    db: Arc<Db>,
    directory: Arc<dyn UserDirectory>,
    intake: SubscriptionRequestIntake,
) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("answering callback from user {} failed: {}", q.from.id.0, e);
    }
    let action = match q.data.as_deref().map(str::parse::<MenuAction>) {
        Some(Ok(action)) => action,
        _ => return Ok(()),
    };

    let applicant = applicant_from(&q.from);
    let (chat_id, message_id) = match &q.message {
        Some(m) => (m.chat().id, Some(m.id())),
        None => (ChatId(applicant.user_id), None),
    };
    let notifier = TelegramNotifier::new(bot, chat_id, message_id);

    let ctx = CallbackContext {
        cfg: &cfg,
        db: &db,
        directory: directory.as_ref(),
        intake: &intake,
        notifier: &notifier,
    };
    if let Err(e) = ctx.route(action, &applicant).await {
        error!(
            "callback {} failed for user {}: {}",
            action.as_str(),
            applicant.user_id,
            e
        );
    }
    Ok(())
}

/// Everything a callback needs, independent of the Telegram update
pub struct CallbackContext<'a> {
    pub cfg: &'a Config,
    pub db: &'a Db,
    pub directory: &'a dyn UserDirectory,
    pub intake: &'a SubscriptionRequestIntake,
    pub notifier: &'a dyn Notifier,
}

impl CallbackContext<'_> {
    pub async fn route(&self, action: MenuAction, applicant: &Applicant) -> anyhow::Result<()> {
        let user_id = applicant.user_id;
        let screen = match action {
            MenuAction::Back => {
                let w = start::load_welcome(self.cfg, self.db, self.directory, applicant, None).await?;
                start::welcome_screen(&w)
            }
            MenuAction::PostingCommands => {
                let is_admin = self.cfg.is_admin(user_id)
                    || self.db.get_user(user_id).await?.is_some_and(|u| u.is_admin);
                help::posting_commands_screen(is_admin)
            }
            MenuAction::Referral => {
                let link = referral::referral_link(self.cfg.bot_username.as_deref(), user_id);
                let count = self.db.referral_count(user_id).await?;
                referral::referral_screen(&link, count)
            }
            MenuAction::Trial => {
                return trial::handle_trial(self.cfg, self.db, self.directory, self.notifier, applicant)
                    .await;
            }
            MenuAction::Subscription => {
                self.intake.submit_request(self.notifier, applicant).await;
                return Ok(());
            }
            MenuAction::UsageInfo => help::usage_info_screen(),
            help_action => match help::help_screen(help_action) {
                Some(screen) => screen,
                None => return Ok(()),
            },
        };
        self.notifier.edit_current_message(&screen).await
    }
}
