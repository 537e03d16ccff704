use log::info;
use std::sync::Arc;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{TweetRecord, UserRecord};
use crate::store::{JsonFileStore, MemoryStore, RecordStore};

/// Shared handler state: one store per collection.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn RecordStore<UserRecord>>,
    pub tweets: Arc<dyn RecordStore<TweetRecord>>,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Opens `users.json` and `tweets.json` under the configured data
    /// directory, creating empty collections where needed.
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        let users = JsonFileStore::new(config.users_path());
        let tweets = JsonFileStore::new(config.tweets_path());
        users.ensure_exists().await?;
        tweets.ensure_exists().await?;
        info!(
            "Using collections {} and {}",
            users.path().display(),
            tweets.path().display()
        );

        Ok(Self {
            users: Arc::new(users),
            tweets: Arc::new(tweets),
            bcrypt_cost: config.bcrypt_cost,
        })
    }

    pub fn in_memory(bcrypt_cost: u32) -> Self {
        Self {
            users: Arc::new(MemoryStore::new()),
            tweets: Arc::new(MemoryStore::new()),
            bcrypt_cost,
        }
    }
}
