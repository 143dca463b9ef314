//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (UserProfile, BotCommand)
//! - Traits: Abstractions for infrastructure (Bot, Store)

pub mod entities;
pub mod traits;
