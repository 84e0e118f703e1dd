//! In-memory cache of generated blog articles awaiting `/publish`

use std::collections::VecDeque;

use shared::BlogArticle;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const DEFAULT_ARTICLE_CAPACITY: usize = 100;

/// Bounded cache keyed by short ids; the oldest entry is evicted first
pub struct ArticleCache {
    entries: Mutex<VecDeque<(String, BlogArticle)>>,
    capacity: usize,
}

impl Default for ArticleCache {
    fn default() -> Self {
        Self::new(DEFAULT_ARTICLE_CAPACITY)
    }
}

impl ArticleCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Store an article and return its 8-character id
    pub async fn insert(&self, article: BlogArticle) -> String {
        let id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back((id.clone(), article));
        id
    }

    pub async fn get(&self, id: &str) -> Option<BlogArticle> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(_, article)| article.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> BlogArticle {
        BlogArticle {
            title: title.to_string(),
            meta_description: String::new(),
            slug: String::new(),
            html_content: "<p>x</p>".to_string(),
            word_count: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = ArticleCache::default();
        let id = cache.insert(article("uno")).await;

        assert_eq!(id.len(), 8);
        assert_eq!(cache.get(&id).await.unwrap().title, "uno");
        assert!(cache.get("missing0").await.is_none());
    }

    #[tokio::test]
    async fn test_oldest_entry_is_evicted() {
        let cache = ArticleCache::new(2);
        let first = cache.insert(article("a")).await;
        cache.insert(article("b")).await;
        let third = cache.insert(article("c")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&first).await.is_none());
        assert!(cache.get(&third).await.is_some());
    }
}
