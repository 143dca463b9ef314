//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod profile;

pub use command::BotCommand;
pub use profile::{BodyMetrics, UserProfile};
