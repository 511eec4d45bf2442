//! Telegram front ends: the user-facing bot and the approver bot.

pub mod admin;
pub mod commands;
pub mod replies;
pub mod transport;
pub mod user;
