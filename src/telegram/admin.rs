//! Approver bot: binds the approver chat and applies approve/reject presses.

use crate::core::gateway::{ApprovalAction, DecisionOutcome, NotificationGateway};
use crate::infrastructure::admin_chat::AdminChatStore;
use crate::telegram::commands::AdminCommand;
use crate::telegram::replies;
use log::{error, info, warn};
use std::sync::Arc;
use teloxide::prelude::*;

pub async fn run(bot: Bot, gateway: Arc<NotificationGateway>, admin_chat: Arc<AdminChatStore>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<AdminCommand>()
                .endpoint(on_command),
        )
        .branch(Update::filter_callback_query().endpoint(on_decision));

    info!("admin bot starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![gateway, admin_chat])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("admin bot stopped");
}

async fn on_command(
    bot: Bot,
    msg: Message,
    command: AdminCommand,
    admin_chat: Arc<AdminChatStore>,
) -> ResponseResult<()> {
    match command {
        AdminCommand::Start => {
            if let Err(e) = admin_chat.bind(msg.chat.id.0).await {
                error!("admin chat binding not persisted: {e}");
            }
            info!("approver chat linked: {}", msg.chat.id.0);
            bot.send_message(
                msg.chat.id,
                "🔐 Admin linked! You'll receive photo logs and payment approvals here.",
            )
            .await?;
        }
    }
    Ok(())
}

async fn on_decision(
    bot: Bot,
    query: CallbackQuery,
    gateway: Arc<NotificationGateway>,
) -> ResponseResult<()> {
    let Some(action) = query.data.as_deref().and_then(ApprovalAction::parse) else {
        warn!("unrecognised callback data: {:?}", query.data);
        bot.answer_callback_query(query.id.clone())
            .text("Unknown action")
            .await?;
        return Ok(());
    };

    let outcome = match gateway.resolve(action).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("decision on payment {} failed: {e}", action.payment_id);
            bot.answer_callback_query(query.id.clone())
                .text("⚠️ Could not update the payment, try again")
                .await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(query.id.clone())
        .text(replies::decision_ack(&outcome, action.decision))
        .await?;

    if let (DecisionOutcome::Applied(_), Some(message)) = (&outcome, query.regular_message()) {
        let caption = format!(
            "{}\n\n{}",
            message.caption().unwrap_or_default(),
            replies::decision_stamp(action.decision)
        );
        if let Err(e) = bot
            .edit_message_caption(message.chat.id, message.id)
            .caption(caption)
            .await
        {
            warn!("approver message not updated: {e}");
        }
    }
    Ok(())
}
