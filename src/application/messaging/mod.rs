//! Message handling - Command parsing and dispatching

pub mod dispatcher;
pub mod parser;

pub use dispatcher::Dispatcher;
pub use parser::CommandParser;
