// src/menu.rs

//! Callback-data vocabulary and the renderable screen type shared by all menus
use std::str::FromStr;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Every callback the start/help surface reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Back,
    PostingCommands,
    Referral,
    Trial,
    Subscription,
    UsageInfo,
    HelpAccount,
    HelpGroups,
    HelpPosting,
    HelpResponses,
    HelpReferrals,
    HelpAdmin,
}

impl MenuAction {
    pub const ALL: [MenuAction; 12] = [
        MenuAction::Back,
        MenuAction::PostingCommands,
        MenuAction::Referral,
        MenuAction::Trial,
        MenuAction::Subscription,
        MenuAction::UsageInfo,
        MenuAction::HelpAccount,
        MenuAction::HelpGroups,
        MenuAction::HelpPosting,
        MenuAction::HelpResponses,
        MenuAction::HelpReferrals,
        MenuAction::HelpAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MenuAction::Back => "start_back",
            MenuAction::PostingCommands => "start_posting_commands",
            MenuAction::Referral => "start_referral",
            MenuAction::Trial => "start_trial",
            MenuAction::Subscription => "start_subscription",
            MenuAction::UsageInfo => "start_usage_info",
            MenuAction::HelpAccount => "help_account",
            MenuAction::HelpGroups => "help_groups",
            MenuAction::HelpPosting => "help_posting",
            MenuAction::HelpResponses => "help_responses",
            MenuAction::HelpReferrals => "help_referrals",
            MenuAction::HelpAdmin => "help_admin",
        }
    }
}

impl FromStr for MenuAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MenuAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Action { label: String, action: MenuAction },
    Link { label: String, url: String },
}

impl Button {
    pub fn action(label: impl Into<String>, action: MenuAction) -> Self {
        Button::Action {
            label: label.into(),
            action,
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Link {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Button::Action { label, .. } | Button::Link { label, .. } => label,
        }
    }
}

/// One button per row, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, button: Button) -> Self {
        self.rows.push(vec![button]);
        self
    }

    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    pub fn has_action(&self, action: MenuAction) -> bool {
        self.buttons()
            .any(|b| matches!(b, Button::Action { action: a, .. } if *a == action))
    }

    pub fn link(&self) -> Option<&str> {
        self.buttons().find_map(|b| match b {
            Button::Link { url, .. } => Some(url.as_str()),
            _ => None,
        })
    }

    /// Links that fail to parse as URLs are dropped with a warning
    pub fn to_markup(&self) -> InlineKeyboardMarkup {
        let rows = self.rows.iter().map(|row| {
            row.iter()
                .filter_map(|b| match b {
                    Button::Action { label, action } => {
                        Some(InlineKeyboardButton::callback(label.clone(), action.as_str()))
                    }
                    Button::Link { label, url } => match url.parse() {
                        Ok(url) => Some(InlineKeyboardButton::url(label.clone(), url)),
                        Err(e) => {
                            log::warn!("dropping button `{}` with bad url {}: {}", label, url, e);
                            None
                        }
                    },
                })
                .collect::<Vec<_>>()
        });
        InlineKeyboardMarkup::new(rows.filter(|row| !row.is_empty()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    MarkdownV2,
}

/// Text plus affordances, ready to be sent or edited in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Keyboard,
    pub format: Format,
}

impl Screen {
    pub fn plain(text: impl Into<String>) -> Self {
        Screen {
            text: text.into(),
            keyboard: Keyboard::new(),
            format: Format::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Screen {
            format: Format::MarkdownV2,
            ..Screen::plain(text)
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }
}
