//! Decides when a live page is re-classified.
//!
//! One [`Scheduler`] watches one page. Page events arrive on a channel and
//! are handled by a single task, which also owns the two timer slots:
//!
//! - mutations are debounced on the trailing edge: every mutation pushes the
//!   deadline to [`MUTATION_DEBOUNCE`] after itself, and only the last batch
//!   of a burst is evaluated;
//! - scrolls are throttled on the leading edge: the first scroll schedules an
//!   evaluation [`SCROLL_THROTTLE`] later and further scrolls are ignored
//!   until it has fired.
//!
//! Load milestones evaluate at most once each. Every evaluation rescans the
//! whole page. Positive results are handed to the [`SiteRepository`] on a
//! detached task; the loop never waits for the write.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::page::{PageSource, ReadyState};
use crate::storage::sites::{InsertOutcome, SiteRecord, SiteRepository};

pub const MUTATION_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(2000);

/// Summary of one batch of tree changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub added_nodes: usize,
    pub removed_nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Structural content finished parsing
    DomContentLoaded,
    /// All resources finished loading
    Load,
    Mutation(MutationBatch),
    Scroll,
}

/// What caused an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Load,
    Mutation,
    Scroll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub evaluations: usize,
    pub matches: usize,
    pub initial: usize,
    pub load: usize,
    pub mutation: usize,
    pub scroll: usize,
}

impl SchedulerStats {
    fn record(&mut self, trigger: Trigger) {
        self.evaluations += 1;
        match trigger {
            Trigger::Initial => self.initial += 1,
            Trigger::Load => self.load += 1,
            Trigger::Mutation => self.mutation += 1,
            Trigger::Scroll => self.scroll += 1,
        }
    }
}

struct PendingMutation {
    deadline: Instant,
    batch: MutationBatch,
}

pub struct Scheduler {
    page: Arc<dyn PageSource>,
    classifier: Arc<Classifier>,
    sites: Arc<SiteRepository>,
    debounce: Option<PendingMutation>,
    throttle: Option<Instant>,
    initial_done: bool,
    load_done: bool,
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new(
        page: Arc<dyn PageSource>,
        classifier: Arc<Classifier>,
        sites: Arc<SiteRepository>,
    ) -> Self {
        Self {
            page,
            classifier,
            sites,
            debounce: None,
            throttle: None,
            initial_done: false,
            load_done: false,
            stats: SchedulerStats::default(),
        }
    }

    /// Handle events until the sender side closes. Pending timers are
    /// dropped at that point.
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>) -> SchedulerStats {
        if self.page.ready_state() != ReadyState::Loading {
            self.initial_done = true;
            self.evaluate(Trigger::Initial);
        }

        loop {
            let debounce_at = self.debounce.as_ref().map(|pending| pending.deadline);
            let throttle_at = self.throttle;

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                _ = sleep_until_or_never(debounce_at) => {
                    if let Some(pending) = self.debounce.take() {
                        debug!("Mutation burst settled ({:?})", pending.batch);
                        self.evaluate(Trigger::Mutation);
                    }
                }
                _ = sleep_until_or_never(throttle_at) => {
                    self.throttle = None;
                    self.evaluate(Trigger::Scroll);
                }
            }
        }

        debug!("Page event stream closed after {} evaluations", self.stats.evaluations);
        self.stats
    }

    fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::DomContentLoaded => {
                if !self.initial_done {
                    self.initial_done = true;
                    self.evaluate(Trigger::Initial);
                }
            }
            PageEvent::Load => {
                if !self.load_done {
                    self.load_done = true;
                    self.evaluate(Trigger::Load);
                }
            }
            PageEvent::Mutation(batch) => {
                self.debounce = Some(PendingMutation {
                    deadline: Instant::now() + MUTATION_DEBOUNCE,
                    batch,
                });
            }
            PageEvent::Scroll => {
                if self.throttle.is_none() {
                    self.throttle = Some(Instant::now() + SCROLL_THROTTLE);
                }
            }
        }
    }

    /// Classify the current page and, on a match, persist it in the background.
    fn evaluate(&mut self, trigger: Trigger) {
        self.stats.record(trigger);
        debug!("Scanning for newsletter/subscribe blocks ({:?})", trigger);

        let page = match self.page.snapshot() {
            Ok(page) => page,
            Err(e) => {
                warn!("Could not snapshot page: {}", e);
                return;
            }
        };

        if !self.classifier.classify(&page) {
            return;
        }

        self.stats.matches += 1;
        let record = SiteRecord::from_page(&page);
        let sites = Arc::clone(&self.sites);

        tokio::spawn(async move {
            let url = record.url.clone();
            match sites.insert_unique(record).await {
                Ok(InsertOutcome::Inserted { total }) => {
                    info!("Recorded {} ({} sites)", url, total)
                }
                Ok(InsertOutcome::Duplicate) => debug!("Already recorded: {}", url),
                Err(e) => warn!("Failed to record {}: {}", url, e),
            }
        });
    }
}

async fn sleep_until_or_never(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_by_trigger() {
        let mut stats = SchedulerStats::default();
        stats.record(Trigger::Initial);
        stats.record(Trigger::Mutation);
        stats.record(Trigger::Mutation);
        stats.record(Trigger::Scroll);

        assert_eq!(stats.evaluations, 4);
        assert_eq!(stats.initial, 1);
        assert_eq!(stats.mutation, 2);
        assert_eq!(stats.scroll, 1);
        assert_eq!(stats.load, 0);
    }

    #[test]
    fn test_windows() {
        assert_eq!(MUTATION_DEBOUNCE, Duration::from_millis(1000));
        assert_eq!(SCROLL_THROTTLE, Duration::from_millis(2000));
    }
}
