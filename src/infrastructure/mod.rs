//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Data persistence
//! - Adapters: Platform integrations (Telegram)
//! - Document: Docx template engine

pub mod adapters;
pub mod config;
pub mod document;
pub mod storage;
