use crate::menu::{Button, Keyboard, MenuAction, Screen};
use teloxide::utils::markdown::{code_inline, escape};

/// Deep link that starts the bot with a `ref_<id>` payload
pub fn referral_link(bot_username: Option<&str>, user_id: i64) -> String {
    match bot_username {
        Some(name) => format!("https://t.me/{}?start=ref_{}", name.trim_start_matches('@'), user_id),
        None => String::new(),
    }
}

pub fn referral_screen(link: &str, count: i64) -> Screen {
    let link = if link.is_empty() {
        escape("(referral link unavailable)")
    } else {
        code_inline(link)
    };
    let text = format!(
        "*{}*\n{}\n\n{}\n\n{}",
        escape("🔗 Your referral link:"),
        link,
        escape(&format!("Active referrals: {}", count)),
        escape("Share this link with your friends to get extra benefits!"),
    );
    Screen::markdown(text).with_keyboard(Keyboard::new().row(Button::action("🔙 Back", MenuAction::Back)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_uses_bot_username() {
        assert_eq!(
            referral_link(Some("@poster_bot"), 42),
            "https://t.me/poster_bot?start=ref_42"
        );
        assert_eq!(referral_link(None, 42), "");
    }

    #[test]
    fn screen_shows_count_and_escaped_link() {
        let screen = referral_screen("https://t.me/poster_bot?start=ref_42", 3);
        assert!(screen.text.contains("Active referrals: 3"));
        assert!(screen.text.contains("`https://t.me/poster_bot?start=ref_42`"));
        assert!(screen.keyboard.has_action(MenuAction::Back));

        let missing = referral_screen("", 0);
        assert!(missing.text.contains(r"\(referral link unavailable\)"));
    }
}
