use clap::{Parser, Subcommand};
use std::time::Duration;

use physrand_bot::application::messaging::Dispatcher;
use physrand_bot::domain::traits::{Bot, Store};
use physrand_bot::infrastructure::adapters::telegram::TelegramAdapter;
use physrand_bot::infrastructure::config::Config;
use physrand_bot::infrastructure::storage::FlatFileStore;

#[derive(Parser)]
#[command(name = "physrand-bot")]
#[command(about = "Telegram bot that fills self-monitoring diaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config, cli.token);
        }
        Commands::Version => {
            println!("physrand-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: String, token_override: Option<String>) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting {}", config.bot.name);

    let token = match token_override {
        Some(token) => token,
        None => match config.require_token() {
            Ok(token) => token.to_string(),
            Err(e) => {
                tracing::error!("{}: set telegram.token in config.yaml or BOT_TOKEN", e);
                std::process::exit(1);
            }
        },
    };

    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    rt.block_on(async {
        // Restore persisted state; missing files mean a first run
        let store = FlatFileStore::new(&config.storage.state_dir);
        if let Err(e) = store.init().await {
            tracing::error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
        tracing::info!(
            "Storage initialized, {} known chats",
            store.chat_ids().await.map(|ids| ids.len()).unwrap_or(0)
        );

        let mut bot = TelegramAdapter::new(token);
        if let Err(e) = bot.fetch_bot_info().await {
            tracing::error!("Failed to fetch bot info: {}", e);
            std::process::exit(1);
        }
        tracing::info!("Bot started: @{}", bot.bot_info().username);

        if let Err(e) = bot.register_commands().await {
            tracing::warn!("Failed to register commands: {}", e);
        }

        let dispatcher = Dispatcher::new(
            config.bot.help_message.clone(),
            config.storage.template_path.clone(),
            config.storage.files_dir.clone(),
        );

        run_loop(&bot, &store, &dispatcher, config.telegram.poll_timeout as i64).await;
    });
}

/// Long-poll loop: each message is handled to completion before the next
async fn run_loop(
    bot: &TelegramAdapter,
    store: &FlatFileStore,
    dispatcher: &Dispatcher,
    poll_timeout: i64,
) {
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, poll_timeout).await {
            Ok(updates) => {
                if updates.is_empty() {
                    continue;
                }
                offset = TelegramAdapter::get_next_offset(&updates).max(offset);

                for update in &updates {
                    let Some(msg) = &update.message else {
                        continue;
                    };
                    let chat_id = msg.chat.id;
                    let username = msg
                        .from
                        .as_ref()
                        .and_then(|u| u.username.as_deref())
                        .or(msg.chat.username.as_deref());

                    let result = if let Some(document) = &msg.document {
                        dispatcher
                            .handle_document(
                                bot,
                                store,
                                chat_id,
                                username,
                                &document.file_id,
                                document.file_name.as_deref(),
                            )
                            .await
                    } else if let Some(text) = &msg.text {
                        dispatcher.handle_text(bot, store, chat_id, username, text).await
                    } else {
                        Ok(())
                    };

                    if let Err(e) = result {
                        tracing::error!("Handler failed for chat {}: {}", chat_id, e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Polling failed: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write("config.yaml", yaml) {
                tracing::error!("Failed to write config.yaml: {}", e);
                std::process::exit(1);
            }
            println!("Wrote default config to config.yaml");
        }
        Err(e) => {
            tracing::error!("Failed to serialize config: {}", e);
            std::process::exit(1);
        }
    }
}
