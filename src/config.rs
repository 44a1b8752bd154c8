use anyhow::Result;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub token: String,
    pub log_level: Option<String>,
    pub socks5_proxy: Option<String>,
    /// Account users are sent to for manual subscription approval
    pub operator_id: i64,
    #[serde(default)]
    pub admins: Vec<i64>,
    pub db_path: Option<String>,
    pub trial_days: Option<i64>,
    pub bot_username: Option<String>,
    pub login_enabled: Option<bool>,
}

impl Config {
    /// Read and parse `Config` from a TOML file
    pub fn load(path: &str) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s)?;
        Ok(cfg)
    }

    /// Log level, "info" when unset
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn db_path(&self) -> &str {
        self.db_path
            .as_deref()
            .unwrap_or("data/user_statistics.sqlite")
    }

    pub fn trial_days(&self) -> i64 {
        self.trial_days.unwrap_or(1)
    }

    pub fn login_enabled(&self) -> bool {
        self.login_enabled.unwrap_or(true)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }
}
