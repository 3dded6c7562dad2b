use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::cli::commands::open_repository;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::page::{FilePage, PageSource};
use crate::scheduler::{MutationBatch, PageEvent, Scheduler};
use crate::storage::StorageChange;

/// How often the watched file is checked for modifications.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const EVENT_BUFFER: usize = 64;

/// Run the scheduler against a page file until Ctrl-C. Every modification
/// of the file is delivered as a tree mutation.
pub async fn watch(file: PathBuf, url: String, config: &Config) -> Result<()> {
    let page = Arc::new(FilePage::new(&file, url)?);
    // fail early on an unreadable file
    page.snapshot()?;

    let repo = Arc::new(open_repository(config)?);
    let mut changes = repo.subscribe();
    let classifier = Arc::new(Classifier::new()?);

    let (events, receiver) = mpsc::channel(EVENT_BUFFER);
    let scheduler = Scheduler::new(page.clone(), classifier, repo);
    let handle = tokio::spawn(scheduler.run(receiver));

    send(&events, PageEvent::Load).await?;
    println!("👀 Watching {} (Ctrl-C to stop)", page.path().display());

    let mut last_modified = page.modified().ok();
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watch of {}", page.path().display());
                break;
            }
            _ = poll.tick() => {
                let modified = page.modified().ok();
                if modified != last_modified {
                    debug!("{} changed", page.path().display());
                    last_modified = modified;
                    send(&events, PageEvent::Mutation(MutationBatch::default())).await?;
                }
            }
            Ok(change) = changes.recv() => {
                if let Some(title) = added_title(&change) {
                    println!("✓ Added: {}", title);
                }
            }
        }
    }

    drop(events);
    let stats = handle
        .await
        .map_err(|e| Error::Invalid(format!("Scheduler task failed: {}", e)))?;

    println!(
        "Evaluations: {} (initial {}, load {}, mutation {}, scroll {}), matches: {}",
        stats.evaluations, stats.initial, stats.load, stats.mutation, stats.scroll, stats.matches
    );
    Ok(())
}

async fn send(events: &mpsc::Sender<PageEvent>, event: PageEvent) -> Result<()> {
    events
        .send(event)
        .await
        .map_err(|_| Error::Invalid("Scheduler stopped unexpectedly".to_string()))
}

/// Title of the newest record when a change grew the list.
fn added_title(change: &StorageChange) -> Option<String> {
    let old_len = change
        .old_value
        .as_ref()
        .and_then(|value| value.as_array())
        .map_or(0, Vec::len);
    let new_sites = change.new_value.as_array()?;

    if new_sites.len() <= old_len {
        return None;
    }

    new_sites
        .first()
        .and_then(|site| site.get("title"))
        .and_then(|title| title.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(old: Option<serde_json::Value>, new: serde_json::Value) -> StorageChange {
        StorageChange {
            key: "sites".to_string(),
            old_value: old,
            new_value: new,
        }
    }

    #[test]
    fn test_added_title_on_growth() {
        let change = change(
            Some(json!([{"title": "Old"}])),
            json!([{"title": "New"}, {"title": "Old"}]),
        );
        assert_eq!(added_title(&change), Some("New".to_string()));
    }

    #[test]
    fn test_added_title_from_empty_store() {
        let change = change(None, json!([{"title": "First"}]));
        assert_eq!(added_title(&change), Some("First".to_string()));
    }

    #[test]
    fn test_no_title_on_delete_or_clear() {
        assert_eq!(added_title(&change(Some(json!([{"title": "A"}])), json!([]))), None);
        assert_eq!(
            added_title(&change(Some(json!([{"title": "A"}, {"title": "B"}])), json!([{"title": "B"}]))),
            None
        );
    }
}
