// src/directory.rs
use anyhow::Result;
use async_trait::async_trait;
use log::error;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::Bot;

/// Label used whenever the operator's profile cannot be resolved
pub const OPERATOR_FALLBACK_LABEL: &str = "the administrator";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub display_name: Option<String>,
    pub contact_link: Option<String>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve_profile(&self, user_id: i64) -> Result<Profile>;
}

/// Resolves profiles through `getChat`
#[derive(Clone)]
pub struct TelegramDirectory {
    bot: Bot,
}

impl TelegramDirectory {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl UserDirectory for TelegramDirectory {
    async fn resolve_profile(&self, user_id: i64) -> Result<Profile> {
        let chat = self.bot.get_chat(ChatId(user_id)).await?;
        Ok(profile_from_names(
            user_id,
            chat.username(),
            chat.first_name(),
        ))
    }
}

/// `@username` with a t.me link, else the first name with a `tg://` link
pub fn profile_from_names(user_id: i64, username: Option<&str>, first_name: Option<&str>) -> Profile {
    match (username, first_name) {
        (Some(u), _) => Profile {
            display_name: Some(format!("@{}", u)),
            contact_link: Some(format!("https://t.me/{}", u)),
        },
        (None, Some(name)) => Profile {
            display_name: Some(name.to_string()),
            contact_link: Some(format!("tg://user?id={}", user_id)),
        },
        (None, None) => Profile::default(),
    }
}

/// How the operator is presented to users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContact {
    pub label: String,
    pub link: Option<String>,
}

impl OperatorContact {
    pub fn fallback() -> Self {
        OperatorContact {
            label: OPERATOR_FALLBACK_LABEL.to_string(),
            link: None,
        }
    }

    /// Never fails: lookup errors are logged and degrade to the generic label
    pub async fn resolve(directory: &dyn UserDirectory, operator_id: i64) -> Self {
        match directory.resolve_profile(operator_id).await {
            Ok(profile) => OperatorContact {
                label: profile
                    .display_name
                    .unwrap_or_else(|| OPERATOR_FALLBACK_LABEL.to_string()),
                link: profile.contact_link,
            },
            Err(e) => {
                error!("could not fetch operator details for {}: {}", operator_id, e);
                Self::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<Profile>);

    #[async_trait]
    impl UserDirectory for Fixed {
        async fn resolve_profile(&self, _user_id: i64) -> Result<Profile> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("chat not found"))
        }
    }

    #[test]
    fn username_wins_over_first_name() {
        let p = profile_from_names(9, Some("op"), Some("Olga"));
        assert_eq!(p.display_name.as_deref(), Some("@op"));
        assert_eq!(p.contact_link.as_deref(), Some("https://t.me/op"));

        let p = profile_from_names(9, None, Some("Olga"));
        assert_eq!(p.display_name.as_deref(), Some("Olga"));
        assert_eq!(p.contact_link.as_deref(), Some("tg://user?id=9"));

        assert_eq!(profile_from_names(9, None, None), Profile::default());
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_fallback() {
        let contact = OperatorContact::resolve(&Fixed(None), 1).await;
        assert_eq!(contact, OperatorContact::fallback());
        assert_eq!(contact.label, "the administrator");
    }

    #[tokio::test]
    async fn empty_profile_keeps_generic_label() {
        let contact = OperatorContact::resolve(&Fixed(Some(Profile::default())), 1).await;
        assert_eq!(contact.label, OPERATOR_FALLBACK_LABEL);
        assert!(contact.link.is_none());
    }
}
