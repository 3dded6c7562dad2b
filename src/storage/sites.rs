use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::badge::{Badge, ACCENT_COLOR};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::storage::traits::{KeyValueStore, StorageChange};

/// Key holding the ordered sites list.
pub const SITES_KEY: &str = "sites";

/// Maximum number of records kept; the oldest are dropped first.
pub const MAX_SITES: usize = 100;

/// Title stored for pages without one.
pub const UNTITLED: &str = "Без названия";

/// A page found to contain a subscription form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub url: String,
    pub title: String,
    /// Localized discovery time, `DD.MM.YYYY, HH:MM:SS`
    #[serde(rename = "date")]
    pub discovered_at: String,
    #[serde(default)]
    pub hostname: String,
}

impl SiteRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        hostname: impl Into<String>,
        discovered_at: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            hostname: hostname.into(),
            discovered_at: discovered_at.into(),
        }
    }

    /// Record for `page`, stamped with the current local time.
    pub fn from_page(page: &Page) -> Self {
        let title = page.title();
        let title = match title.trim() {
            "" => UNTITLED.to_string(),
            trimmed => trimmed.to_string(),
        };

        Self::new(page.url().as_str(), title, page.hostname(), local_timestamp())
    }

    /// Stored hostname, or the one parsed from `url` for older records.
    pub fn display_hostname(&self) -> String {
        if !self.hostname.is_empty() {
            return self.hostname.clone();
        }

        url::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

pub fn local_timestamp() -> String {
    Local::now().format("%d.%m.%Y, %H:%M:%S").to_string()
}

/// Result of [`SiteRepository::insert_unique`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { total: usize },
    Duplicate,
}

/// Insert `record` at the head unless its url is already present, then cap
/// the list at [`MAX_SITES`]. Returns whether the list changed.
pub fn insert_at_head(sites: &mut Vec<SiteRecord>, record: SiteRecord) -> bool {
    if sites.iter().any(|site| site.url == record.url) {
        return false;
    }

    sites.insert(0, record);
    sites.truncate(MAX_SITES);
    true
}

/// The persisted, newest-first list of discovered sites
pub struct SiteRepository {
    store: Arc<dyn KeyValueStore>,
    badge: Arc<dyn Badge>,
    write_lock: Mutex<()>,
}

impl SiteRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, badge: Arc<dyn Badge>) -> Self {
        Self {
            store,
            badge,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<SiteRecord>> {
        match self.store.get(SITES_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Dedup-insert-cap. The badge is refreshed only when the list changed.
    pub async fn insert_unique(&self, record: SiteRecord) -> Result<InsertOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut sites = self.list().await?;
        let title = record.title.clone();
        let url = record.url.clone();

        if !insert_at_head(&mut sites, record) {
            debug!("Already saved: {}", url);
            return Ok(InsertOutcome::Duplicate);
        }

        self.save(&sites).await?;
        self.badge.set_text(&sites.len().to_string());
        self.badge.set_background_color(ACCENT_COLOR);

        info!("Saved newsletter page: {} ({})", title, url);
        Ok(InsertOutcome::Inserted { total: sites.len() })
    }

    /// Remove the record at 0-based `index`.
    pub async fn delete(&self, index: usize) -> Result<SiteRecord> {
        let _guard = self.write_lock.lock().await;

        let mut sites = self.list().await?;
        if index >= sites.len() {
            return Err(Error::NotFound(format!(
                "No site at position {} (list has {})",
                index + 1,
                sites.len()
            )));
        }

        let removed = sites.remove(index);
        self.save(&sites).await?;
        self.badge.set_text(&sites.len().to_string());
        self.badge.set_background_color(ACCENT_COLOR);

        info!("Deleted site: {}", removed.url);
        Ok(removed)
    }

    /// Remove every record. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let removed = self.list().await?.len();
        self.save(&[]).await?;
        self.badge.set_text("");

        info!("Cleared {} sites", removed);
        Ok(removed)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StorageChange> {
        self.store.subscribe()
    }

    async fn save(&self, sites: &[SiteRecord]) -> Result<()> {
        self.store.set(SITES_KEY, serde_json::to_value(sites)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::RecordingBadge;
    use crate::storage::traits::MemoryStore;
    use serde_json::json;

    fn record(n: usize) -> SiteRecord {
        SiteRecord::new(
            format!("https://site{}.example.com/", n),
            format!("Site {}", n),
            format!("site{}.example.com", n),
            "01.01.2026, 10:00:00",
        )
    }

    fn repository() -> (SiteRepository, Arc<RecordingBadge>) {
        let badge = Arc::new(RecordingBadge::new());
        let repo = SiteRepository::new(Arc::new(MemoryStore::new()), badge.clone());
        (repo, badge)
    }

    #[test]
    fn test_record_serializes_with_date_key() {
        let value = serde_json::to_value(record(1)).unwrap();
        assert_eq!(value["date"], json!("01.01.2026, 10:00:00"));
        assert!(value.get("discovered_at").is_none());
    }

    #[test]
    fn test_record_without_hostname_deserializes() {
        let record: SiteRecord = serde_json::from_value(json!({
            "url": "https://news.example.org/a",
            "title": "A",
            "date": "02.02.2026, 12:00:00"
        }))
        .unwrap();
        assert_eq!(record.hostname, "");
        assert_eq!(record.display_hostname(), "news.example.org");
    }

    #[test]
    fn test_from_page_uses_placeholder_title() {
        let page = Page::parse("https://example.com/x", "<title>   </title>").unwrap();
        let record = SiteRecord::from_page(&page);
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.hostname, "example.com");
        assert_eq!(record.url, "https://example.com/x");
    }

    #[test]
    fn test_local_timestamp_shape() {
        let stamp = local_timestamp();
        assert_eq!(stamp.len(), "18.10.2026, 14:03:22".len());
        assert_eq!(&stamp[2..3], ".");
        assert_eq!(&stamp[10..12], ", ");
    }

    #[test]
    fn test_insert_at_head_caps_list() {
        let mut sites: Vec<_> = (0..MAX_SITES).map(record).collect();
        assert!(insert_at_head(&mut sites, record(MAX_SITES)));
        assert_eq!(sites.len(), MAX_SITES);
        assert_eq!(sites[0], record(MAX_SITES));
        assert!(!sites.contains(&record(MAX_SITES - 1)));
    }

    #[tokio::test]
    async fn test_insert_unique_updates_badge() {
        let (repo, badge) = repository();

        let outcome = repo.insert_unique(record(1)).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted { total: 1 });
        assert_eq!(badge.state().text, "1");
        assert_eq!(badge.state().color.as_deref(), Some(ACCENT_COLOR));
    }

    #[tokio::test]
    async fn test_duplicate_leaves_badge_untouched() {
        let (repo, badge) = repository();
        repo.insert_unique(record(1)).await.unwrap();

        let outcome = repo.insert_unique(record(1)).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Duplicate);
        assert_eq!(badge.state().updates, 1);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (repo, badge) = repository();
        for n in 0..3 {
            repo.insert_unique(record(n)).await.unwrap();
        }

        // newest first: 2, 1, 0
        let removed = repo.delete(1).await.unwrap();
        assert_eq!(removed, record(1));
        assert_eq!(repo.list().await.unwrap(), vec![record(2), record(0)]);
        assert_eq!(badge.state().text, "2");

        assert!(repo.delete(5).await.is_err());

        assert_eq!(repo.clear().await.unwrap(), 2);
        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(badge.state().text, "");
    }
}
