//! Application services - Business logic orchestration

pub mod diary;

pub use diary::{DiaryService, FillOutcome};
