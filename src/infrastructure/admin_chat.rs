//! File-backed binding of the approver chat.
//!
//! Whoever sends `/start` to the admin bot becomes the approver. The chat id
//! survives restarts in a small JSON file.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct AdminChatFile {
    chat_id: Option<i64>,
}

pub struct AdminChatStore {
    path: PathBuf,
    chat_id: RwLock<Option<i64>>,
}

impl AdminChatStore {
    /// Loads a previous binding from `path`. A missing or unreadable file
    /// leaves the store unbound.
    pub async fn load(path: impl Into<PathBuf>) -> AdminChatStore {
        let path = path.into();
        let chat_id = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<AdminChatFile>(&contents) {
                Ok(file) => file.chat_id,
                Err(e) => {
                    warn!("ignoring malformed admin chat file {}: {e}", path.display());
                    None
                }
            },
            Err(_) => None,
        };

        AdminChatStore {
            path,
            chat_id: RwLock::new(chat_id),
        }
    }

    pub async fn chat_id(&self) -> Option<i64> {
        *self.chat_id.read().await
    }

    pub async fn bind(&self, chat_id: i64) -> std::io::Result<()> {
        let mut current = self.chat_id.write().await;
        *current = Some(chat_id);

        let contents = serde_json::to_string(&AdminChatFile {
            chat_id: Some(chat_id),
        })?;
        tokio::fs::write(&self.path, contents).await
    }
}
