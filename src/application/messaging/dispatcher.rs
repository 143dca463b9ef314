//! Command dispatcher - Routes incoming messages to handlers

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::application::errors::BotError;
use crate::application::messaging::parser::CommandParser;
use crate::application::services::{DiaryService, FillOutcome};
use crate::domain::entities::{BodyMetrics, BotCommand, UserProfile};
use crate::domain::traits::{Bot, Store};

const USAGE_SET: &str = "Usage:\n/set 170 70";
const MSG_IMPLAUSIBLE: &str = "Those values look implausible, try again";
const MSG_ALIVE: &str = "Alive";
const MSG_NEED_METRICS: &str = "Set your height and weight first:\n/set 170 70";
const MSG_NOT_A_TEMPLATE: &str =
    "No empty columns found, this is not a valid template. Download a fresh one with /template and resend it";
const MSG_TEMPLATE_MISSING: &str = "The template file is unavailable right now, try again later";
const MSG_FILLING: &str = "Filling your diary:";
const MSG_DONE: &str =
    "Save the filled table for yourself and clear it down to the number of columns you need";

/// Name of the document sent back to the user
const FILLED_DOC_NAME: &str = "diary_full.docx";

/// Routes parsed commands and document uploads to their handlers
pub struct Dispatcher {
    parser: CommandParser,
    diary: DiaryService,
    help_message: String,
    template_path: PathBuf,
    files_dir: PathBuf,
    started_at: DateTime<Utc>,
}

impl Dispatcher {
    pub fn new(
        help_message: impl Into<String>,
        template_path: impl Into<PathBuf>,
        files_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parser: CommandParser::new(),
            diary: DiaryService::new(),
            help_message: help_message.into(),
            template_path: template_path.into(),
            files_dir: files_dir.into(),
            started_at: Utc::now(),
        }
    }

    /// Handle a text message; non-commands are ignored
    pub async fn handle_text<B: Bot, S: Store>(
        &self,
        bot: &B,
        store: &S,
        chat_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<(), BotError> {
        let Some(command) = self.parser.parse(text) else {
            return Ok(());
        };

        tracing::debug!("Command /{} from {}", command.as_str(), chat_id);

        match command {
            BotCommand::Start => self.handle_start(bot, store, chat_id, username).await,
            BotCommand::Help => bot.send_message(chat_id, &self.help_message).await,
            BotCommand::Set(metrics) => self.handle_set(bot, store, chat_id, username, metrics).await,
            BotCommand::SetInvalid => bot.send_markdown(chat_id, USAGE_SET).await,
            BotCommand::Template => self.handle_template(bot, chat_id).await,
            BotCommand::Ping => bot.send_message(chat_id, MSG_ALIVE).await,
            BotCommand::Status => self.handle_status(bot, store, chat_id).await,
            BotCommand::Unknown(_) => Ok(()),
        }
    }

    async fn handle_start<B: Bot, S: Store>(
        &self,
        bot: &B,
        store: &S,
        chat_id: i64,
        username: Option<&str>,
    ) -> Result<(), BotError> {
        if store.register_chat(chat_id).await? {
            tracing::info!("New chat {}", chat_id);
            store
                .save_profile(chat_id, UserProfile::new(username))
                .await?;
        }
        bot.send_message(chat_id, &self.help_message).await
    }

    async fn handle_set<B: Bot, S: Store>(
        &self,
        bot: &B,
        store: &S,
        chat_id: i64,
        username: Option<&str>,
        metrics: BodyMetrics,
    ) -> Result<(), BotError> {
        if !metrics.is_plausible() {
            return bot.send_message(chat_id, MSG_IMPLAUSIBLE).await;
        }

        let mut profile = store
            .get_profile(chat_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(username));
        profile.set_metrics(metrics);
        let bmi = profile.bmi.unwrap_or_default();
        store.save_profile(chat_id, profile).await?;

        bot.send_message(chat_id, &format!("Saved. BMI: {:.2}", bmi))
            .await
    }

    async fn handle_template<B: Bot>(&self, bot: &B, chat_id: i64) -> Result<(), BotError> {
        match tokio::fs::read(&self.template_path).await {
            Ok(bytes) => bot.send_document(chat_id, "template.docx", bytes).await,
            Err(e) => {
                tracing::error!("Cannot read template {:?}: {}", self.template_path, e);
                bot.send_message(chat_id, MSG_TEMPLATE_MISSING).await
            }
        }
    }

    async fn handle_status<B: Bot, S: Store>(
        &self,
        bot: &B,
        store: &S,
        chat_id: i64,
    ) -> Result<(), BotError> {
        let profile = store.get_profile(chat_id).await?;
        let state = match profile.as_ref().and_then(|p| p.metrics.as_ref()) {
            Some(metrics) => format!(
                "Height {:.2} m, weight {} kg, BMI {:.2}",
                metrics.height,
                metrics.weight,
                metrics.bmi()
            ),
            None => "No height/weight set. Use /set 170 70".to_string(),
        };

        let text = format!("{}\nUptime: {}", state, format_uptime(self.started_at));
        bot.send_message(chat_id, &text).await
    }

    /// Handle an uploaded document: download, merge, send back filled
    pub async fn handle_document<B: Bot, S: Store>(
        &self,
        bot: &B,
        store: &S,
        chat_id: i64,
        username: Option<&str>,
        file_id: &str,
        file_name: Option<&str>,
    ) -> Result<(), BotError> {
        let Some(profile) = store.get_profile(chat_id).await?.filter(UserProfile::has_metrics)
        else {
            return bot.send_markdown(chat_id, MSG_NEED_METRICS).await;
        };

        tracing::info!("Generating docx for chat {}", chat_id);
        let bytes = bot.download_file(file_id).await?;

        // Keep the upload on disk while it is being processed
        let upload_path = self
            .upload_dir(chat_id, username)
            .join(file_name.unwrap_or("upload.docx"));
        if let Some(parent) = upload_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BotError::Internal(e.to_string()))?;
        }
        tokio::fs::write(&upload_path, &bytes)
            .await
            .map_err(|e| BotError::Internal(e.to_string()))?;

        let result = match self.diary.fill(&bytes, &profile) {
            Ok(FillOutcome::NotATemplate) => bot.send_message(chat_id, MSG_NOT_A_TEMPLATE).await,
            Ok(FillOutcome::Filled(filled)) => {
                bot.send_message(chat_id, MSG_FILLING).await?;
                bot.send_document(chat_id, FILLED_DOC_NAME, filled).await?;
                bot.send_message(chat_id, MSG_DONE).await
            }
            Err(e) => {
                // Not a docx at all gets the same user-facing answer
                tracing::warn!("Unreadable document from chat {}: {}", chat_id, e);
                bot.send_message(chat_id, MSG_NOT_A_TEMPLATE).await
            }
        };

        if let Err(e) = tokio::fs::remove_file(&upload_path).await {
            tracing::warn!("Cannot remove upload {:?}: {}", upload_path, e);
        }

        result
    }

    fn upload_dir(&self, chat_id: i64, username: Option<&str>) -> PathBuf {
        let dir = match username {
            Some(name) => format!("{}_{}", chat_id, name),
            None => chat_id.to_string(),
        };
        self.files_dir.join(dir)
    }
}

/// Format elapsed time with its largest nonzero unit
fn format_uptime(since: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(since);
    if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m", elapsed.num_minutes())
    } else {
        format!("{}s", elapsed.num_seconds().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::traits::BotInfo;
    use crate::infrastructure::document::tests::docx_with_text;
    use crate::infrastructure::storage::FlatFileStore;

    /// Records everything the dispatcher sends
    #[derive(Default)]
    struct MockBot {
        messages: Mutex<Vec<(i64, String)>>,
        /// Texts that went through the markdown path, also mirrored in `messages`
        markdown: Mutex<Vec<String>>,
        documents: Mutex<Vec<(i64, String, Vec<u8>)>>,
        /// Returned from download_file
        file: Mutex<Vec<u8>>,
    }

    impl MockBot {
        fn with_file(bytes: Vec<u8>) -> Self {
            Self {
                file: Mutex::new(bytes),
                ..Self::default()
            }
        }

        fn sent_messages(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|(_, text)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Bot for MockBot {
        async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
            self.messages
                .lock()
                .unwrap()
                .push((chat_id, text.to_string()));
            Ok(())
        }

        async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
            self.markdown.lock().unwrap().push(text.to_string());
            self.send_message(chat_id, text).await
        }

        async fn send_document(
            &self,
            chat_id: i64,
            filename: &str,
            bytes: Vec<u8>,
        ) -> Result<(), BotError> {
            self.documents
                .lock()
                .unwrap()
                .push((chat_id, filename.to_string(), bytes));
            Ok(())
        }

        async fn download_file(&self, _file_id: &str) -> Result<Vec<u8>, BotError> {
            Ok(self.file.lock().unwrap().clone())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo::default()
        }
    }

    async fn store_in(dir: &std::path::Path) -> FlatFileStore {
        let store = FlatFileStore::new(dir.join("db"));
        store.init().await.unwrap();
        store
    }

    fn dispatcher_in(dir: &std::path::Path) -> Dispatcher {
        Dispatcher::new(
            "help text",
            dir.join("_template.docx"),
            dir.join("files"),
        )
    }

    #[tokio::test]
    async fn ping_replies_alive() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 1, None, "/ping")
            .await
            .unwrap();
        assert_eq!(bot.sent_messages(), vec!["Alive"]);
    }

    #[tokio::test]
    async fn start_registers_chat_and_sends_help() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 10, Some("alice"), "/start")
            .await
            .unwrap();

        assert_eq!(store.chat_ids().await.unwrap(), vec![10]);
        let profile = store.get_profile(10).await.unwrap().unwrap();
        assert_eq!(profile.username.as_deref(), Some("alice"));
        assert_eq!(bot.sent_messages(), vec!["help text"]);
    }

    #[tokio::test]
    async fn repeated_start_keeps_existing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 10, Some("alice"), "/start")
            .await
            .unwrap();
        dispatcher
            .handle_text(&bot, &store, 10, Some("alice"), "/set 170 70")
            .await
            .unwrap();
        dispatcher
            .handle_text(&bot, &store, 10, Some("alice"), "/start")
            .await
            .unwrap();

        let profile = store.get_profile(10).await.unwrap().unwrap();
        assert!(profile.has_metrics());
        assert_eq!(store.chat_ids().await.unwrap(), vec![10]);
    }

    #[tokio::test]
    async fn set_stores_metrics_and_replies_with_bmi() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 2, Some("bob"), "/set 170 70")
            .await
            .unwrap();

        let profile = store.get_profile(2).await.unwrap().unwrap();
        assert_eq!(profile.metrics, Some(BodyMetrics::new(1.7, 70.0)));
        assert_eq!(bot.sent_messages(), vec!["Saved. BMI: 24.22"]);
        // Backfilled into the registry even without /start
        assert!(store.chat_ids().await.unwrap().contains(&2));
    }

    #[tokio::test]
    async fn malformed_set_gets_usage_message() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 3, None, "/set tall heavy")
            .await
            .unwrap();

        assert_eq!(bot.sent_messages(), vec![USAGE_SET]);
        assert!(store.get_profile(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn implausible_set_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 3, None, "/set 400 70")
            .await
            .unwrap();
        dispatcher
            .handle_text(&bot, &store, 3, None, "/set 170 500")
            .await
            .unwrap();

        assert_eq!(
            bot.sent_messages(),
            vec![MSG_IMPLAUSIBLE, MSG_IMPLAUSIBLE]
        );
        assert!(store.get_profile(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usage_prompts_go_through_the_markdown_path() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 12, None, "/set nonsense")
            .await
            .unwrap();
        dispatcher
            .handle_document(&bot, &store, 12, None, "file-5", None)
            .await
            .unwrap();

        let markdown = bot.markdown.lock().unwrap();
        assert_eq!(*markdown, vec![USAGE_SET, MSG_NEED_METRICS]);
        // Plain replies never take the markdown path
        drop(markdown);
        dispatcher
            .handle_text(&bot, &store, 12, None, "/ping")
            .await
            .unwrap();
        assert_eq!(bot.markdown.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn plain_text_and_unknown_commands_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 4, None, "hello")
            .await
            .unwrap();
        dispatcher
            .handle_text(&bot, &store, 4, None, "/frobnicate")
            .await
            .unwrap();

        assert!(bot.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn status_reports_uptime_and_missing_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 5, None, "/status")
            .await
            .unwrap();

        let messages = bot.sent_messages();
        assert!(messages[0].contains("No height/weight set"));
        assert!(messages[0].contains("Uptime: 0s"));
    }

    #[tokio::test]
    async fn template_is_sent_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());
        tokio::fs::write(dir.path().join("_template.docx"), b"stub")
            .await
            .unwrap();

        dispatcher
            .handle_text(&bot, &store, 6, None, "/template")
            .await
            .unwrap();

        let documents = bot.documents.lock().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].1, "template.docx");
    }

    #[tokio::test]
    async fn upload_without_metrics_prompts_for_set() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (MockBot::default(), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_document(&bot, &store, 7, None, "file-1", None)
            .await
            .unwrap();

        assert_eq!(bot.sent_messages(), vec![MSG_NEED_METRICS]);
    }

    #[tokio::test]
    async fn upload_fills_template_and_sends_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let doc = docx_with_text("{1_0_1} {height} {weight} {imt}");
        let (bot, store) = (MockBot::with_file(doc), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 8, Some("gina"), "/set 170 70")
            .await
            .unwrap();
        dispatcher
            .handle_document(&bot, &store, 8, Some("gina"), "file-2", Some("diary.docx"))
            .await
            .unwrap();

        let messages = bot.sent_messages();
        assert!(messages.contains(&MSG_FILLING.to_string()));
        assert!(messages.contains(&MSG_DONE.to_string()));

        let documents = bot.documents.lock().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].1, FILLED_DOC_NAME);

        // The temporary upload copy was cleaned up
        assert!(!dir.path().join("files/8_gina/diary.docx").exists());
    }

    #[tokio::test]
    async fn upload_of_non_docx_bytes_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (bot, store) = (
            MockBot::with_file(b"%PDF-1.4 definitely not a docx".to_vec()),
            store_in(dir.path()).await,
        );
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 11, None, "/set 170 70")
            .await
            .unwrap();
        dispatcher
            .handle_document(&bot, &store, 11, None, "file-4", Some("scan.pdf"))
            .await
            .unwrap();

        let messages = bot.sent_messages();
        assert_eq!(messages.last().unwrap(), MSG_NOT_A_TEMPLATE);
        assert!(bot.documents.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_of_filled_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = docx_with_text("no placeholders at all");
        let (bot, store) = (MockBot::with_file(doc), store_in(dir.path()).await);
        let dispatcher = dispatcher_in(dir.path());

        dispatcher
            .handle_text(&bot, &store, 9, None, "/set 180 80")
            .await
            .unwrap();
        dispatcher
            .handle_document(&bot, &store, 9, None, "file-3", None)
            .await
            .unwrap();

        let messages = bot.sent_messages();
        assert_eq!(messages.last().unwrap(), MSG_NOT_A_TEMPLATE);
        assert!(bot.documents.lock().unwrap().is_empty());
    }
}
