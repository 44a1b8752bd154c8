//! Posting-commands menu and its help pages
use crate::menu::{Button, Keyboard, MenuAction, Screen};
use teloxide::utils::markdown::escape;

pub fn posting_commands_screen(is_admin: bool) -> Screen {
    let mut keyboard = Keyboard::new()
        .row(Button::action("🔑 Account commands", MenuAction::HelpAccount))
        .row(Button::action("👥 Group commands", MenuAction::HelpGroups))
        .row(Button::action("📝 Posting commands", MenuAction::HelpPosting))
        .row(Button::action("🤖 Auto-response commands", MenuAction::HelpResponses))
        .row(Button::action("🔗 Referral commands", MenuAction::HelpReferrals));
    if is_admin {
        keyboard = keyboard.row(Button::action("👨‍💼 Admin commands", MenuAction::HelpAdmin));
    }
    keyboard = keyboard.row(Button::action("🔙 Back to start", MenuAction::Back));
    Screen::plain("📝 Available posting commands:\n\n").with_keyboard(keyboard)
}

/// Help page for a `help_*` action; `None` for anything else
pub fn help_screen(action: MenuAction) -> Option<Screen> {
    let (title, lines): (&str, &[&str]) = match action {
        MenuAction::HelpAccount => ("🔑 Account commands:", ACCOUNT),
        MenuAction::HelpGroups => ("👥 Group commands:", GROUPS),
        MenuAction::HelpPosting => ("📝 Posting commands:", POSTING),
        MenuAction::HelpResponses => ("🤖 Auto-response commands:", RESPONSES),
        MenuAction::HelpReferrals => ("🔗 Referral commands:", REFERRALS),
        MenuAction::HelpAdmin => ("👨‍💼 Admin commands:", ADMIN),
        _ => return None,
    };
    let keyboard = Keyboard::new().row(Button::action(
        "🔙 Back to posting commands",
        MenuAction::PostingCommands,
    ));
    Some(Screen::markdown(page(title, lines)).with_keyboard(keyboard))
}

pub fn usage_info_screen() -> Screen {
    let mut text = page("ℹ️ Usage information:", USAGE);
    text.push_str("\n\n");
    text.push_str(&page("Available commands:", USAGE_COMMANDS));
    Screen::markdown(text)
        .with_keyboard(Keyboard::new().row(Button::action("🔙 Back", MenuAction::Back)))
}

/// Bold title followed by escaped body lines
fn page(title: &str, lines: &[&str]) -> String {
    let body = lines
        .iter()
        .map(|l| escape(l))
        .collect::<Vec<_>>()
        .join("\n");
    format!("*{}*\n\n{}", escape(title), body)
}

const ACCOUNT: &[&str] = &[
    "- /login: log in to your Telegram account so the bot can post on your behalf.",
    "- /logout: log out of your Telegram account.",
    "- /check_login: check whether you are currently logged in.",
];

const GROUPS: &[&str] = &[
    "- /add_group <group_id>: add a group to post in. Forward a message from the group to @RawDataBot to find its id.",
    "- /list_groups: show every group you have added.",
    "- /remove_group <group_id>: remove a group from the posting list.",
];

const POSTING: &[&str] = &[
    "- /schedule_post <group_id> <time> <message>: schedule a message for a group. Example: /schedule_post -1001234567890 2025-12-31 14:30 Welcome to our group!",
    "- /list_posts: show every scheduled message.",
    "- /cancel_post <post_id>: cancel a scheduled message.",
];

const RESPONSES: &[&str] = &[
    "- /set_response <keyword> <reply>: reply automatically when a keyword is mentioned in a group. Example: /set_response hello Welcome!",
    "- /list_responses: show every auto-response.",
    "- /remove_response <keyword>: remove an auto-response.",
];

const REFERRALS: &[&str] = &[
    "- /my_referrals: show your referral link and how many users joined through it.",
    "- /set_referral_bonus <amount>: (admins) set the referral bonus.",
];

const ADMIN: &[&str] = &[
    "- /broadcast <message>: send a message to every bot user.",
    "- /stats: show bot usage statistics.",
    "- /grant_trial <user_id>: grant a user a free trial.",
    "- /grant_subscription <user_id> <days>: grant a user a paid subscription.",
    "- /revoke_subscription <user_id>: revoke a user's subscription.",
    "- /list_users: list every bot user.",
    "- /list_requests: show pending subscription requests.",
    "- /approve_request <request_id>: approve a subscription request.",
    "- /deny_request <request_id>: deny a subscription request.",
];

const USAGE: &[&str] = &[
    "This bot automates posting messages in Telegram groups.",
    "",
    "Main features:",
    "- Scheduled posts",
    "- Group management",
    "- Usage statistics",
    "- Referral support",
    "",
    "Getting started:",
    "1. Make sure you have an active subscription.",
    "2. Use /login to log in to your Telegram account (if needed).",
    "3. Use /add_group to add the groups you want to post in.",
    "4. Use /schedule_post to schedule your messages.",
];

const USAGE_COMMANDS: &[&str] = &[
    "- /login, /logout, /check_login: account session.",
    "- /add_group, /list_groups, /remove_group: posting targets.",
    "- /schedule_post, /list_posts, /cancel_post: scheduled messages.",
    "- /set_response, /list_responses, /remove_response: auto-responses.",
    "- /my_referrals: your referral link and count.",
    "- /api_info: about API ID and API Hash.",
    "- /broadcast, /stats, /list_users: (admins) bot management.",
    "- /grant_trial, /grant_subscription, /revoke_subscription: (admins) subscriptions.",
    "- /list_requests, /approve_request, /deny_request: (admins) subscription requests.",
];
