use std::sync::Arc;

use tracing::info;

use crate::errors::{PortalError, Result};
use crate::storage::{InsertOutcome, SavedItem, SeaOrmStorage};

/// Reader bookmarks
pub struct SavedArticleService {
    storage: Arc<SeaOrmStorage>,
}

impl SavedArticleService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Save an article; saving twice is a no-op
    pub async fn save(&self, user_id: i64, article_id: i64) -> Result<()> {
        if !self.storage.article_exists(article_id).await? {
            return Err(PortalError::not_found(format!(
                "Notícia {} não encontrada",
                article_id
            )));
        }

        if self.storage.insert_saved_article(user_id, article_id).await? == InsertOutcome::Inserted
        {
            info!("SavedArticleService: user {} saved article {}", user_id, article_id);
        }
        Ok(())
    }

    /// Remove exactly that bookmark; false if it did not exist
    pub async fn remove(&self, user_id: i64, article_id: i64) -> Result<bool> {
        self.storage.delete_saved_article(user_id, article_id).await
    }

    /// Newest bookmark first
    pub async fn list(&self, user_id: i64) -> Result<Vec<SavedItem>> {
        self.storage.saved_articles(user_id).await
    }
}
