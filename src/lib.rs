// src/lib.rs

pub mod cmd;
pub mod commands;
pub mod config;
pub mod db;
pub mod directory;
pub mod intake;
pub mod menu;
pub mod models;
pub mod notify;
