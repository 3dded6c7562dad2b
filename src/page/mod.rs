//! Snapshots of a rendered page and the sources that produce them.
//!
//! A [`Page`] is what the classifier looks at: the parsed main tree plus any
//! isolated sub-trees (shadow roots) attached to elements of that tree. The
//! isolated sub-trees are separate documents, so walking the main tree never
//! reaches them; they are only reachable through [`Page::shadow_root`].

pub mod source;

use std::collections::BTreeMap;

use select::document::Document;
use select::node::Node;
use select::predicate::{Attr, Name};
use url::Url;

use crate::error::{Error, Result};

pub use source::{FilePage, InMemoryPage};

/// Parsing progress of a live document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Structural content is still being parsed
    Loading,
    /// Structure is parsed, sub-resources may still be loading
    Interactive,
    /// Everything has finished loading
    Complete,
}

/// A live document that can be snapshotted at any time.
pub trait PageSource: Send + Sync {
    fn ready_state(&self) -> ReadyState;

    /// Current state of the document, parsed from scratch.
    fn snapshot(&self) -> Result<Page>;
}

/// One parsed snapshot of a document.
pub struct Page {
    url: Url,
    ready_state: ReadyState,
    document: Document,
    shadow_roots: BTreeMap<usize, Document>,
}

impl Page {
    pub fn parse(url: &str, html: &str) -> Result<Self> {
        let url = Url::parse(url)?;

        Ok(Self {
            url,
            ready_state: ReadyState::Complete,
            document: Document::from(html),
            shadow_roots: BTreeMap::new(),
        })
    }

    pub fn with_ready_state(mut self, ready_state: ReadyState) -> Self {
        self.ready_state = ready_state;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Document title with whitespace collapsed; empty when there is none.
    pub fn title(&self) -> String {
        self.document
            .find(Name("title"))
            .next()
            .map(|node| node.text().split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Index of the first element carrying `id`.
    pub fn element_by_id(&self, id: &str) -> Option<usize> {
        self.document.find(Attr("id", id)).next().map(|node| node.index())
    }

    /// Attach an isolated sub-tree parsed from `fragment` to the element at
    /// `host` in the main tree. Replaces any root already attached there.
    pub fn attach_shadow_root(&mut self, host: usize, fragment: &str) -> Result<()> {
        let is_element = self
            .document
            .nth(host)
            .map_or(false, |node| node.name().is_some());

        if !is_element {
            return Err(Error::NotFound(format!("shadow host element #{}", host)));
        }

        self.shadow_roots.insert(host, Document::from(fragment));
        Ok(())
    }

    /// The isolated sub-tree exposed by `host`, if any. `host` must be a node
    /// of [`Page::document`].
    pub fn shadow_root(&self, host: &Node) -> Option<&Document> {
        self.shadow_roots.get(&host.index())
    }

    pub fn shadow_root_count(&self) -> usize {
        self.shadow_roots.len()
    }
}
