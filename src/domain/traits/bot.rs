use async_trait::async_trait;

use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a plain text message to a chat
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError>;

    /// Send a message with markdown formatting (falls back to plain text)
    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<(), BotError>;

    /// Send a document with the given filename
    async fn send_document(&self, chat_id: i64, filename: &str, bytes: Vec<u8>)
        -> Result<(), BotError>;

    /// Download an uploaded file by its platform file id
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: i64,
    pub name: String,
    pub username: String,
}

impl Default for BotInfo {
    fn default() -> Self {
        Self {
            id: 0,
            name: "physrand-bot".to_string(),
            username: "physrand_bot".to_string(),
        }
    }
}
