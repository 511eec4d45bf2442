//! Telegram-backed collaborators of the conversation engine.

use crate::config::PaymentConfig;
use crate::core::error::GatewayError;
use crate::core::gateway::{ApprovalAction, Decision};
use crate::core::traits::{
    ApproverGateway, OwnerNotifier, PhotoAudit, PhotoStore, StoredPhoto,
};
use crate::infrastructure::admin_chat::AdminChatStore;
use crate::infrastructure::entities::Payment;
use crate::telegram::replies;
use async_trait::async_trait;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

fn telegram_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Telegram(e.to_string())
}

/// Stores photos received by the user bot under `upload_dir`, served by the
/// HTTP server at `<server_url>/uploads/`.
pub struct TelegramPhotoStore {
    bot: Bot,
    upload_dir: PathBuf,
    server_url: String,
}

impl TelegramPhotoStore {
    pub fn new(bot: Bot, upload_dir: impl Into<PathBuf>, server_url: impl Into<String>) -> Self {
        Self {
            bot,
            upload_dir: upload_dir.into(),
            server_url: server_url.into(),
        }
    }
}

#[async_trait]
impl PhotoStore for TelegramPhotoStore {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, GatewayError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_owned()))
            .await
            .map_err(telegram_error)?;

        let mut bytes = Vec::new();
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .map_err(telegram_error)?;
        Ok(bytes)
    }

    async fn persist(&self, file_id: &str) -> Result<StoredPhoto, GatewayError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_owned()))
            .await
            .map_err(telegram_error)?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let filename = format!("{}.jpg", Uuid::new_v4());

        let (upload, mut destination) = PartialUpload::create(&self.upload_dir, &filename).await?;
        self.bot
            .download_file(&file.path, &mut destination)
            .await
            .map_err(telegram_error)?;
        destination.flush().await?;
        drop(destination);
        let path = upload.keep().await?;

        Ok(StoredPhoto {
            url: format!(
                "{}/uploads/{}",
                self.server_url.trim_end_matches('/'),
                filename
            ),
            path,
        })
    }
}

/// Upload written under a `.part` name and renamed into place by
/// [`PartialUpload::keep`]. Dropped unkept, on error or when the download is
/// cancelled, it removes the partial file.
struct PartialUpload {
    partial: PathBuf,
    target: PathBuf,
    kept: bool,
}

impl PartialUpload {
    async fn create(dir: &Path, filename: &str) -> std::io::Result<(PartialUpload, File)> {
        let target = dir.join(filename);
        let partial = dir.join(format!("{filename}.part"));
        let file = File::create(&partial).await?;
        Ok((
            PartialUpload {
                partial,
                target,
                kept: false,
            },
            file,
        ))
    }

    async fn keep(mut self) -> std::io::Result<PathBuf> {
        tokio::fs::rename(&self.partial, &self.target).await?;
        self.kept = true;
        Ok(self.target.clone())
    }
}

impl Drop for PartialUpload {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.partial) {
            warn!("partial upload {} not removed: {e}", self.partial.display());
        }
    }
}

/// Talks to the approver through the admin bot. Without an admin bot token
/// or a linked chat every call fails with `ApproverUnavailable`.
pub struct TelegramApproverGateway {
    admin_bot: Option<Bot>,
    admin_chat: Arc<AdminChatStore>,
    payment: PaymentConfig,
}

impl TelegramApproverGateway {
    pub fn new(
        admin_bot: Option<Bot>,
        admin_chat: Arc<AdminChatStore>,
        payment: PaymentConfig,
    ) -> Self {
        Self {
            admin_bot,
            admin_chat,
            payment,
        }
    }

    async fn target(&self) -> Result<(&Bot, ChatId), GatewayError> {
        let bot = self
            .admin_bot
            .as_ref()
            .ok_or(GatewayError::ApproverUnavailable)?;
        let chat_id = self
            .admin_chat
            .chat_id()
            .await
            .ok_or(GatewayError::ApproverUnavailable)?;
        Ok((bot, ChatId(chat_id)))
    }
}

#[async_trait]
impl ApproverGateway for TelegramApproverGateway {
    async fn request_approval(
        &self,
        payment: &Payment,
        screenshot: Vec<u8>,
    ) -> Result<(), GatewayError> {
        let (bot, chat_id) = self.target().await?;

        let buttons = [Decision::Approve, Decision::Reject].map(|decision| {
            let data = ApprovalAction {
                decision,
                payment_id: payment.id,
            }
            .callback_data();
            match decision {
                Decision::Approve => InlineKeyboardButton::callback("✅ Approve", data),
                Decision::Reject => InlineKeyboardButton::callback("❌ Reject", data),
            }
        });

        bot.send_photo(
            chat_id,
            InputFile::memory(screenshot).file_name(format!("pay_{}.jpg", payment.id)),
        )
        .caption(replies::payment_caption(payment, &self.payment))
        .reply_markup(InlineKeyboardMarkup::new([buttons]))
        .await
        .map_err(telegram_error)?;

        info!("payment {} sent for approval", payment.id);
        Ok(())
    }

    async fn audit_photo(
        &self,
        photo: &StoredPhoto,
        audit: &PhotoAudit,
    ) -> Result<(), GatewayError> {
        let (bot, chat_id) = self.target().await?;

        bot.send_photo(chat_id, InputFile::file(photo.path.clone()))
            .caption(replies::audit_caption(audit))
            .await
            .map_err(telegram_error)?;
        Ok(())
    }
}

/// Tells payment owners about decisions through the user bot.
pub struct TelegramOwnerNotifier {
    bot: Bot,
    payment: PaymentConfig,
}

impl TelegramOwnerNotifier {
    pub fn new(bot: Bot, payment: PaymentConfig) -> Self {
        Self { bot, payment }
    }
}

#[async_trait]
impl OwnerNotifier for TelegramOwnerNotifier {
    async fn notify_decision(
        &self,
        chat_id: i64,
        decision: Decision,
    ) -> Result<(), GatewayError> {
        self.bot
            .send_message(
                ChatId(chat_id),
                replies::decision_notice(decision, &self.payment),
            )
            .await
            .map_err(telegram_error)?;
        Ok(())
    }
}
