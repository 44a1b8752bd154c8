// src/main.rs

use anyhow::Result;
use chrono::Local;
use env_logger::Builder;
use log::info;
use std::io::Write;
use std::sync::Arc;
use teloxide::Bot;
use tg_autopost::config::Config;
use tg_autopost::db::Db;
use tg_autopost::directory::{TelegramDirectory, UserDirectory};
use tg_autopost::intake::{RequestStore, SubscriptionRequestIntake};
use tg_autopost::cmd;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    // —— config —— //
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = Config::load(&path)?;

    // —— logging —— //
    Builder::new()
        .format(|buf, rec| {
            writeln!(
                buf,
                "[{} {:<5}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                rec.level(),
                rec.args()
            )
        })
        .filter_level(cfg.log_level().parse()?)
        .init();
    info!("log level = {}", cfg.log_level());

    // —— database —— //
    let db = Arc::new(Db::open(cfg.db_path()).await?);
    info!("Database initialised at {}", cfg.db_path());

    // —— bot and services —— //
    let bot = build_bot(&cfg)?;
    let directory: Arc<dyn UserDirectory> = Arc::new(TelegramDirectory::new(bot.clone()));
    let store: Arc<dyn RequestStore> = db.clone();
    let intake = SubscriptionRequestIntake::new(store, directory.clone(), cfg.operator_id);

    info!("Starting to process Telegram updates");
    cmd::cmd_dispatch(bot, cfg, db, directory, intake).await;
    info!("Dispatcher stopped");
    Ok(())
}

fn build_bot(cfg: &Config) -> Result<Bot> {
    match &cfg.socks5_proxy {
        Some(proxy) => {
            info!("using proxy {}", proxy);
            let client = teloxide::net::default_reqwest_settings()
                .proxy(reqwest::Proxy::all(proxy)?)
                .build()?;
            Ok(Bot::with_client(cfg.token.clone(), client))
        }
        None => Ok(Bot::new(cfg.token.clone())),
    }
}
