use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::page::{Page, PageSource, ReadyState};

/// A live page held in memory. Markup, ready state and shadow roots can be
/// changed at any time; every snapshot reparses the current markup.
pub struct InMemoryPage {
    url: String,
    state: RwLock<PageState>,
}

struct PageState {
    html: String,
    ready_state: ReadyState,
    /// (host element id, fragment markup)
    shadow_roots: Vec<(String, String)>,
}

impl InMemoryPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: RwLock::new(PageState {
                html: html.into(),
                ready_state: ReadyState::Complete,
                shadow_roots: Vec::new(),
            }),
        }
    }

    pub fn with_ready_state(self, ready_state: ReadyState) -> Self {
        self.state.write().ready_state = ready_state;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_html(&self, html: impl Into<String>) {
        self.state.write().html = html.into();
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.write().ready_state = ready_state;
    }

    /// Expose an isolated sub-tree from the element whose id is `host_id`.
    /// Hosts missing from a snapshot are skipped for that snapshot.
    pub fn attach_shadow_root(&self, host_id: impl Into<String>, fragment: impl Into<String>) {
        self.state
            .write()
            .shadow_roots
            .push((host_id.into(), fragment.into()));
    }
}

impl PageSource for InMemoryPage {
    fn ready_state(&self) -> ReadyState {
        self.state.read().ready_state
    }

    fn snapshot(&self) -> Result<Page> {
        let state = self.state.read();
        let mut page = Page::parse(&self.url, &state.html)?.with_ready_state(state.ready_state);

        for (host_id, fragment) in &state.shadow_roots {
            match page.element_by_id(host_id) {
                Some(host) => page.attach_shadow_root(host, fragment)?,
                None => debug!("Shadow host #{} not present in snapshot of {}", host_id, self.url),
            }
        }

        Ok(page)
    }
}

/// A saved page on disk, reread on every snapshot.
pub struct FilePage {
    path: PathBuf,
    url: String,
}

impl FilePage {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url)?;

        Ok(Self {
            path: path.into(),
            url,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> Result<SystemTime> {
        Ok(std::fs::metadata(&self.path)?.modified()?)
    }
}

impl PageSource for FilePage {
    fn ready_state(&self) -> ReadyState {
        ReadyState::Complete
    }

    fn snapshot(&self) -> Result<Page> {
        let html = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Parse(format!("Failed to read page '{}': {}", self.path.display(), e))
        })?;
        Page::parse(&self.url, &html)
    }
}
