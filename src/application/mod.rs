//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Diary generation and document merge
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing and dispatching

pub mod errors;
pub mod messaging;
pub mod services;
