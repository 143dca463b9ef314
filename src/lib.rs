//! physrand-bot
//!
//! A Telegram bot that fills an academic self-monitoring diary template
//! with plausible randomized physiological readings.
//!
//! This crate provides:
//! - Command dispatch for the fixed bot command set
//! - Flat-file persistence of chat ids and user profiles
//! - Randomized diary column generation and docx template merge
//! - A reqwest-based Telegram Bot API adapter

pub mod application;
pub mod domain;
pub mod infrastructure;
