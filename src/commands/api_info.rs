use crate::menu::Screen;
use teloxide::utils::markdown::escape;

pub fn api_info_screen(login_enabled: bool) -> Screen {
    let mut text = String::new();
    text.push_str(&format!("ℹ️ *{}*\n\n", escape("About API ID and API Hash:")));
    text.push_str(&escape(
        "Some advanced features (such as logging in with your own account) need your own ",
    ));
    text.push_str("`API ID` and `API Hash` ");
    text.push_str(&escape("from Telegram."));
    text.push_str("\n\n*");
    text.push_str(&escape("How to get them:"));
    text.push_str("*\n");
    text.push_str(&escape("1. Open the official app management page: "));
    text.push_str("[https://my\\.telegram\\.org/apps](https://my.telegram.org/apps)\n");
    for line in [
        "2. Log in with your phone number.",
        "3. Fill in the 'Create New Application' form (any name and short description will do, e.g. 'MyBotApp').",
        "4. Once the application is created your api_id and api_hash are shown. Keep them safe and never share them.",
    ] {
        text.push_str(&escape(line));
        text.push('\n');
    }
    text.push('\n');
    if login_enabled {
        text.push_str(&escape(
            "✅ This bot supports logging in with these credentials through commands such as /login or /generate_session.",
        ));
    } else {
        text.push_str(&escape(
            "⚠️ This bot does not currently support logging in directly with the API.",
        ));
    }
    Screen::markdown(text)
}
