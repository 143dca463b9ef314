//! Telegram adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::command::COMMAND_MENU;
use crate::domain::traits::{Bot, BotInfo};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    pub username: Option<String>,
}

/// An uploaded file attachment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo::default(),
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            result: BotInfoResponse,
        }

        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let url = self.api_url("getMe");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = BotInfo {
            id: data.result.id,
            name: data.result.first_name,
            username: data.result.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: Vec<Update>,
        }

        let url = self.api_url("getUpdates");
        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> i64 {
        updates.iter().map(|u| u.update_id + 1).max().unwrap_or(0)
    }

    /// Send a message with a specific parse mode
    async fn send_message_with_format(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest {
            chat_id: i64,
            text: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<String>,
        }

        let url = self.api_url("sendMessage");
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: parse_mode.map(|s| s.to_string()),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Send chat action (typing, upload_document, etc.)
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendChatActionRequest {
            chat_id: i64,
            action: String,
        }

        let url = self.api_url("sendChatAction");
        let request = SendChatActionRequest {
            chat_id,
            action: action.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Chat action error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Register the command menu with Telegram
    pub async fn register_commands(&self) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command {
            command: String,
            description: String,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest {
            commands: Vec<Command>,
        }

        let commands = COMMAND_MENU
            .iter()
            .map(|(command, description)| Command {
                command: (*command).to_string(),
                description: (*description).to_string(),
            })
            .collect();

        let url = self.api_url("setMyCommands");
        let request = SetMyCommandsRequest { commands };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!(
                "Failed to register commands: {}",
                error
            )));
        }

        tracing::info!("Registered bot commands with Telegram");
        Ok(())
    }

    /// Resolve a file id to its download path on the API file server
    async fn get_file_path(&self, file_id: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct GetFileRequest {
            file_id: String,
        }

        #[derive(Deserialize)]
        struct Response {
            result: FileResult,
        }

        #[derive(Deserialize)]
        struct FileResult {
            file_path: Option<String>,
        }

        let url = self.api_url("getFile");
        let request = GetFileRequest {
            file_id: file_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "getFile error: {}",
                response.status()
            )));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        data.result
            .file_path
            .ok_or_else(|| BotError::Parse("getFile returned no file_path".to_string()))
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_message_with_format(chat_id, text, None).await
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        // Try MarkdownV2 first, fall back to plain text
        match self
            .send_message_with_format(chat_id, text, Some("MarkdownV2"))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("Markdown failed, using plain text: {}", e);
                self.send_message_with_format(chat_id, text, None).await
            }
        }
    }

    async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BotError> {
        if let Err(e) = self.send_chat_action(chat_id, "upload_document").await {
            tracing::debug!("Chat action failed for {}: {}", chat_id, e);
        }

        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let url = self.api_url("sendDocument");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("sendDocument error: {}", error)));
        }

        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, BotError> {
        let file_path = self.get_file_path(file_id).await?;
        let url = format!("{}/file/bot{}/{}", API_BASE, self.token, file_path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "File download error: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
