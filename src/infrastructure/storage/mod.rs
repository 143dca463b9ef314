//! Flat-file storage implementation
//!
//! Two files under the state directory:
//! - `chat-ids.db`: newline-delimited chat ids (append-only registry)
//! - `user-infos.db`: one JSON object mapping chat id to profile
//!
//! Both files are rewritten in full after every mutation. Missing files
//! mean a first run with empty state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::UserProfile;
use crate::domain::traits::Store;

const CHAT_IDS_FILE: &str = "chat-ids.db";
const USER_INFOS_FILE: &str = "user-infos.db";

/// Flat-file backed store
pub struct FlatFileStore {
    base_path: PathBuf,
    chat_ids: RwLock<Vec<i64>>,
    profiles: RwLock<HashMap<i64, UserProfile>>,
}

impl FlatFileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            chat_ids: RwLock::new(Vec::new()),
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Create the state directory and load persisted state. Files that do
    /// not exist yet are written out empty so later saves never surprise.
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        match tokio::fs::read_to_string(self.path(CHAT_IDS_FILE)).await {
            Ok(content) => {
                let mut ids = Vec::new();
                for line in content.lines().filter(|l| !l.trim().is_empty()) {
                    let id = line.trim().parse::<i64>().map_err(|e| {
                        StorageError::Serialization(format!("bad chat id {:?}: {}", line, e))
                    })?;
                    ids.push(id);
                }
                *self.chat_ids.write().await = ids;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => self.save_chat_ids().await?,
            Err(e) => return Err(e.into()),
        }

        match tokio::fs::read_to_string(self.path(USER_INFOS_FILE)).await {
            Ok(content) => {
                let keyed: HashMap<String, UserProfile> = serde_json::from_str(&content)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                let mut profiles = HashMap::with_capacity(keyed.len());
                for (key, profile) in keyed {
                    let id = key.parse::<i64>().map_err(|e| {
                        StorageError::Serialization(format!("bad profile key {:?}: {}", key, e))
                    })?;
                    profiles.insert(id, profile);
                }
                *self.profiles.write().await = profiles;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => self.save_profiles().await?,
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    fn path(&self, file: &str) -> PathBuf {
        self.base_path.join(file)
    }

    async fn save_chat_ids(&self) -> Result<(), StorageError> {
        let ids = self.chat_ids.read().await;
        let content = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        tokio::fs::write(self.path(CHAT_IDS_FILE), content).await?;
        Ok(())
    }

    async fn save_profiles(&self) -> Result<(), StorageError> {
        let profiles = self.profiles.read().await;
        // JSON object keyed by the chat id rendered as a string
        let keyed: HashMap<String, &UserProfile> = profiles
            .iter()
            .map(|(id, profile)| (id.to_string(), profile))
            .collect();
        let content = serde_json::to_string(&keyed)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tokio::fs::write(self.path(USER_INFOS_FILE), content).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for FlatFileStore {
    async fn register_chat(&self, chat_id: i64) -> Result<bool, StorageError> {
        {
            let mut ids = self.chat_ids.write().await;
            if ids.contains(&chat_id) {
                return Ok(false);
            }
            ids.push(chat_id);
        }
        self.save_chat_ids().await?;
        Ok(true)
    }

    async fn chat_ids(&self) -> Result<Vec<i64>, StorageError> {
        Ok(self.chat_ids.read().await.clone())
    }

    async fn get_profile(&self, chat_id: i64) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.profiles.read().await.get(&chat_id).cloned())
    }

    async fn save_profile(&self, chat_id: i64, profile: UserProfile) -> Result<(), StorageError> {
        self.profiles.write().await.insert(chat_id, profile);
        self.save_profiles().await?;
        // Keep the registry invariant: a profile implies registration
        self.register_chat(chat_id).await?;
        Ok(())
    }
}
