//! Heuristic detection of newsletter / subscription-capture regions.
//!
//! The scan over-selects candidates with a broad structural query and then
//! decides per candidate, in document order, from four signals. The first
//! candidate that qualifies ends the scan. An email input is mandatory; the
//! keyword, platform and button signals only need one of them to fire.
//!
//! When the main tree has no match, every isolated sub-tree exposed by an
//! element of the main tree is scanned the same way. Sub-trees are not
//! searched for further nested sub-trees.

pub mod predicates;

use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Element, Name, Predicate};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::page::Page;
use predicates::{is_type_email, ButtonLike, Candidate, EmailInput};

/// Levels of context gathered per candidate, the candidate included.
pub const CONTEXT_DEPTH: usize = 5;

/// Substrings of the lower-cased context that count as a keyword signal.
pub const KEYWORDS: &[&str] = &[
    "subscribe",
    "подпис",
    "рассыл",
    "newsletter",
    "subscrib",
    "substack",
    "terms of use",
    "privacy policy",
    "information collection",
    "by subscribing you agree",
    "get updates",
    "join",
    "sign up",
    "email",
    "почт",
    "новост",
];

pub const CAPTURE_CLASS_TOKENS: &[&str] =
    &["subscribe", "newsletter", "signup", "email-capture", "substack"];
pub const OVERLAY_CLASS_TOKENS: &[&str] = &["popup", "modal", "overlay"];
pub const EMAIL_TOKENS: &[&str] = &["email", "почт"];
pub const BUTTON_TOKENS: &[&str] = &["subscribe", "подпис", "sign up"];

pub const PLATFORM_TOKEN: &str = "substack";
pub const PLATFORM_DATA_ATTR: &str = "data-substack";
pub const PLATFORM_DOMAIN: &str = "substack.com";
pub const NOTICE_PHRASE: &str = "information collection notice";

/// Compiled token tables shared by the predicates.
pub struct Patterns {
    keywords: Regex,
    capture_class: Regex,
    overlay_class: Regex,
    email_token: Regex,
    button_label: Regex,
}

impl Patterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // context is already lower-cased
            keywords: alternation(KEYWORDS, false)?,
            capture_class: alternation(CAPTURE_CLASS_TOKENS, true)?,
            overlay_class: alternation(OVERLAY_CLASS_TOKENS, true)?,
            email_token: alternation(EMAIL_TOKENS, true)?,
            button_label: alternation(BUTTON_TOKENS, true)?,
        })
    }
}

fn alternation(tokens: &[&str], case_insensitive: bool) -> Result<Regex> {
    let body = tokens
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = if case_insensitive {
        format!("(?i){}", body)
    } else {
        body
    };

    Regex::new(&pattern).map_err(|e| Error::Parse(e.to_string()))
}

/// Which root a detection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    /// Isolated sub-tree exposed by the main-tree element at `host`
    Shadow { host: usize },
}

/// Per-candidate signals, recomputed on every scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationSignals {
    pub has_email_input: bool,
    pub has_keyword: bool,
    pub is_platform_like: bool,
    pub has_subscribe_button: bool,
}

impl ClassificationSignals {
    pub fn is_subscription_capture(&self) -> bool {
        self.has_email_input
            && (self.has_keyword || self.is_platform_like || self.has_subscribe_button)
    }
}

/// The candidate that ended a positive scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub scope: Scope,
    /// `tag` or `tag.first-class` of the matching element
    pub element: String,
    pub signals: ClassificationSignals,
}

pub struct Classifier {
    patterns: Patterns,
}

impl Classifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: Patterns::new()?,
        })
    }

    /// Whether the page contains a subscription-capture region.
    pub fn classify(&self, page: &Page) -> bool {
        self.detect(page).is_some()
    }

    /// Like [`Classifier::classify`], but reports which element matched and
    /// which signals fired.
    pub fn detect(&self, page: &Page) -> Option<Detection> {
        let platform_link = links_platform(page.document());

        let detection = self
            .scan_root(page.document(), Scope::Document, platform_link)
            .or_else(|| {
                page.document().find(Element).find_map(|host| {
                    let root = page.shadow_root(&host)?;
                    self.scan_root(root, Scope::Shadow { host: host.index() }, platform_link)
                })
            });

        match &detection {
            Some(found) => info!(
                "Found subscription block in {}: {} ({:?}) email_input={} keyword={} platform={} subscribe_button={}",
                page.url(),
                found.element,
                found.scope,
                found.signals.has_email_input,
                found.signals.has_keyword,
                found.signals.is_platform_like,
                found.signals.has_subscribe_button,
            ),
            None => debug!("No newsletter/subscribe block found in {}", page.url()),
        }

        detection
    }

    fn scan_root(&self, root: &Document, scope: Scope, platform_link: bool) -> Option<Detection> {
        root.find(Candidate(&self.patterns)).find_map(|candidate| {
            let signals = self.signals(candidate, scope, platform_link);
            signals.is_subscription_capture().then(|| Detection {
                scope,
                element: element_label(&candidate),
                signals,
            })
        })
    }

    fn signals(&self, candidate: Node, scope: Scope, platform_link: bool) -> ClassificationSignals {
        let has_email_input = is_type_email(&candidate)
            || candidate
                .find(EmailInput { patterns: &self.patterns, match_name: true })
                .next()
                .is_some();

        // Without an email input nothing else can make the candidate qualify.
        if !has_email_input {
            return ClassificationSignals::default();
        }

        let context = context_of(candidate, scope);

        ClassificationSignals {
            has_email_input,
            has_keyword: self.patterns.keywords.is_match(&context),
            is_platform_like: context.contains(PLATFORM_TOKEN)
                || (context.contains("privacy") && context.contains("terms"))
                || has_platform_ancestor(candidate)
                || platform_link
                || context.contains(NOTICE_PHRASE),
            has_subscribe_button: self.has_subscribe_button(candidate),
        }
    }

    fn has_subscribe_button(&self, candidate: Node) -> bool {
        candidate.find(ButtonLike).any(|button| {
            let text = button.text();
            let label = if text.is_empty() {
                button.attr("value").unwrap_or_default()
            } else {
                text.as_str()
            };
            self.patterns.button_label.is_match(label)
        })
    }
}

/// Lower-cased text, class and id of `node` and up to four ancestors.
fn context_of(node: Node, scope: Scope) -> String {
    let mut context = String::new();
    let mut current = Some(node);

    for _ in 0..CONTEXT_DEPTH {
        let Some(element) = current else { break };

        context.push_str(&element.text().to_lowercase());
        context.push(' ');
        context.push_str(&element.attr("class").unwrap_or_default().to_lowercase());
        context.push(' ');
        context.push_str(&element.attr("id").unwrap_or_default().to_lowercase());
        context.push(' ');

        current = parent_element(element, scope);
    }

    context
}

/// Parent element within the same root. Isolated sub-trees are parsed as
/// standalone documents, so their synthetic html/head/body wrappers are not
/// part of the sub-tree.
fn parent_element(node: Node, scope: Scope) -> Option<Node> {
    let parent = node.parent()?;
    match scope {
        Scope::Shadow { .. } if Name("html").or(Name("head")).or(Name("body")).matches(&parent) => {
            None
        }
        _ => Some(parent),
    }
}

fn has_platform_ancestor(node: Node) -> bool {
    let mut current = Some(node);
    while let Some(element) = current {
        if element.attr(PLATFORM_DATA_ATTR).is_some() {
            return true;
        }
        current = element.parent();
    }
    false
}

fn links_platform(document: &Document) -> bool {
    document
        .find(Name("link"))
        .any(|link| link.attr("href").map_or(false, |href| href.contains(PLATFORM_DOMAIN)))
}

fn element_label(node: &Node) -> String {
    let tag = node.name().unwrap_or_default();
    match node.attr("class").and_then(|class| class.split_whitespace().next()) {
        Some(class) => format!("{}.{}", tag, class),
        None => tag.to_string(),
    }
}
