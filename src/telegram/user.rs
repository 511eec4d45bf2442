//! User-facing bot: turns Telegram updates into engine events and sends the
//! engine's reply back.

use crate::config::PaymentConfig;
// aliased: teloxide's prelude exports its own `Requester` trait
use crate::core::engine::{ConversationEngine, Inbound, Requester as ChatUser};
use crate::telegram::commands::UserCommand;
use crate::telegram::replies;
use log::{error, info};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ForceReply;

pub async fn run(bot: Bot, engine: Arc<ConversationEngine>, payment: PaymentConfig) {
    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<UserCommand>()
                .endpoint(on_command),
        )
        .branch(dptree::endpoint(on_message));

    info!("user bot starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine, Arc::new(payment)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("user bot stopped");
}

async fn on_command(
    bot: Bot,
    msg: Message,
    command: UserCommand,
    engine: Arc<ConversationEngine>,
    payment: Arc<PaymentConfig>,
) -> ResponseResult<()> {
    respond(&bot, &msg, Inbound::Command(command.into()), &engine, &payment).await
}

async fn on_message(
    bot: Bot,
    msg: Message,
    engine: Arc<ConversationEngine>,
    payment: Arc<PaymentConfig>,
) -> ResponseResult<()> {
    let Some(event) = inbound(&msg) else {
        return Ok(());
    };
    respond(&bot, &msg, event, &engine, &payment).await
}

/// Photo sizes arrive smallest first.
fn inbound(msg: &Message) -> Option<Inbound> {
    if let Some(sizes) = msg.photo() {
        return Some(Inbound::Photo(
            sizes.iter().map(|size| size.file.id.to_string()).collect(),
        ));
    }
    msg.text().map(|text| Inbound::Text(text.to_owned()))
}

fn requester(msg: &Message) -> ChatUser {
    let user = msg.from.as_ref();
    ChatUser {
        chat_id: msg.chat.id.0,
        user_id: user.map(|user| user.id.0 as i64).unwrap_or(msg.chat.id.0),
        username: user.and_then(|user| user.username.clone()),
        first_name: user.map(|user| user.first_name.clone()),
    }
}

async fn respond(
    bot: &Bot,
    msg: &Message,
    event: Inbound,
    engine: &ConversationEngine,
    payment: &PaymentConfig,
) -> ResponseResult<()> {
    let Some(reply) = engine.handle(&requester(msg), event).await else {
        return Ok(());
    };

    let text = replies::render(&reply, payment);
    let sent = if reply.forces_reply() {
        bot.send_message(msg.chat.id, text)
            .reply_markup(ForceReply::new())
            .await
    } else {
        bot.send_message(msg.chat.id, text).await
    };

    // delivery is best effort; the session already moved on
    if let Err(e) = sent {
        error!("reply to chat {} not delivered: {e}", msg.chat.id.0);
    }
    Ok(())
}
