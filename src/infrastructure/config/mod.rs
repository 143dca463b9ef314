//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;

/// Default usage guide sent for /help and /start
const DEFAULT_HELP: &str = "I fill your self-monitoring diary with randomized data.\n\n\
1. Tell the bot your height and weight (/set 170 70), rounded to whole numbers. \
The BMI is computed from them.\n\
2. Download the diary file with /template\n\
3. Fill in your name, faculty, course and group (the header fields)\n\
4. Send the file back here. The bot replies with the fully filled table; \
save it and clear as many columns as you need.";

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub help_message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub token: Option<String>,
    /// Long-poll timeout in seconds
    pub poll_timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Directory for the chat registry and profile files
    pub state_dir: PathBuf,
    /// Directory for downloaded user uploads
    pub files_dir: PathBuf,
    /// The blank diary template served by /template
    pub template_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "physrand-bot".to_string(),
                help_message: DEFAULT_HELP.to_string(),
            },
            telegram: TelegramConfig {
                token: None,
                poll_timeout: 30,
            },
            storage: StorageConfig {
                state_dir: PathBuf::from("db"),
                files_dir: PathBuf::from("files/user"),
                template_path: PathBuf::from("files/_template.docx"),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Defaults overridden from environment variables
    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            config.telegram.token = Some(token);
        }

        config
    }

    /// The token is the one setting without a usable default
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.telegram
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField("telegram.token".to_string()))
    }
}
