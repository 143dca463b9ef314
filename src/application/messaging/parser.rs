//! Command parser - Matches message text against the fixed command set

use regex_lite::Regex;

use crate::domain::entities::{BodyMetrics, BotCommand};

/// Parses incoming message text into a `BotCommand`
pub struct CommandParser {
    set_args: Regex,
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            // Integer centimeters and kilograms, e.g. "/set 170 70"
            set_args: Regex::new(r"^/set\s+(\d+)\s+(\d+)\s*$").expect("static regex"),
        }
    }

    /// Parse message text; returns None for plain text that is not a command
    pub fn parse(&self, text: &str) -> Option<BotCommand> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        // "/cmd@botname arg" -> "cmd"
        let name = text[1..]
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");

        let command = match name {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "set" => self.parse_set(text),
            "template" => BotCommand::Template,
            "ping" => BotCommand::Ping,
            "status" => BotCommand::Status,
            other => BotCommand::Unknown(other.to_string()),
        };
        Some(command)
    }

    fn parse_set(&self, text: &str) -> BotCommand {
        let Some(caps) = self.set_args.captures(text) else {
            return BotCommand::SetInvalid;
        };

        // Both groups are \d+ so parsing cannot fail, but keep it total
        let (Ok(height_cm), Ok(weight_kg)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>())
        else {
            return BotCommand::SetInvalid;
        };

        BotCommand::Set(BodyMetrics::new(height_cm / 100.0, weight_kg))
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}
