use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::UserProfile;

/// Store trait - persistence abstraction for chat registry and profiles
///
/// Invariant: every chat id with a profile also appears in the registry.
#[async_trait]
pub trait Store: Send + Sync {
    /// Add a chat id to the registry; returns true if it was unseen
    async fn register_chat(&self, chat_id: i64) -> Result<bool, StorageError>;

    /// All registered chat ids
    async fn chat_ids(&self) -> Result<Vec<i64>, StorageError>;

    async fn get_profile(&self, chat_id: i64) -> Result<Option<UserProfile>, StorageError>;

    /// Save a profile, registering the chat id if needed
    async fn save_profile(&self, chat_id: i64, profile: UserProfile) -> Result<(), StorageError>;
}
