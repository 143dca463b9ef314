use super::BodyMetrics;

/// The fixed command set understood by the bot
#[derive(Debug, Clone, PartialEq)]
pub enum BotCommand {
    /// Register the chat and show the usage guide
    Start,
    /// Show the usage guide
    Help,
    /// Store height and weight, `/set <height_cm> <weight_kg>`
    Set(BodyMetrics),
    /// `/set` with arguments that did not parse
    SetInvalid,
    /// Send the blank diary template
    Template,
    /// Liveness check
    Ping,
    /// Report profile state and uptime
    Status,
    /// Anything else starting with `/`
    Unknown(String),
}

impl BotCommand {
    pub fn as_str(&self) -> &str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::Set(_) | BotCommand::SetInvalid => "set",
            BotCommand::Template => "template",
            BotCommand::Ping => "ping",
            BotCommand::Status => "status",
            BotCommand::Unknown(_) => "unknown",
        }
    }
}

/// Command descriptions registered with Telegram via setMyCommands
pub const COMMAND_MENU: &[(&str, &str)] = &[
    ("start", "Start the bot"),
    ("help", "Show help"),
    ("set", "Set height and weight, e.g. /set 170 70"),
    ("template", "Get the blank diary template"),
    ("ping", "Check bot availability"),
    ("status", "Show profile state and uptime"),
];
