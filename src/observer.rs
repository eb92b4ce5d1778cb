//! Re-scan-on-change page observer.
//!
//! Each new page snapshot is parsed in full, the transcript is rebuilt from
//! scratch, and only element subtrees that did not exist in the previous
//! snapshot are checked for limit banners.

use crate::extractor;
use crate::limit::{self, LimitState};
use crate::message::Transcript;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::time::Instant;

static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body selector is valid CSS"));

/// What a snapshot changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageChange {
    pub transcript_changed: bool,
    /// Newly inserted subtree roots.
    pub inserted: usize,
    /// At least one inserted subtree looked like a limit banner.
    pub limit_seen: bool,
    /// This snapshot flipped the limit flag for the first time.
    pub limit_reached_now: bool,
}

#[derive(Default)]
pub struct PageObserver {
    transcript: Transcript,
    limit: LimitState,
    seen: HashSet<u64>,
    digest: Option<u64>,
}

impl PageObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn limit(&self) -> &LimitState {
        &self.limit
    }

    pub fn limit_mut(&mut self) -> &mut LimitState {
        &mut self.limit
    }

    /// Feeds a page snapshot. Returns `None` when it is identical to the
    /// previous one.
    pub fn ingest(&mut self, html: &str, now: Instant) -> Option<PageChange> {
        let digest = hash_of(html);
        if self.digest == Some(digest) {
            return None;
        }
        self.digest = Some(digest);

        let document = Html::parse_document(html);
        let mut change = PageChange::default();

        let transcript = extractor::extract_transcript(&document);
        change.transcript_changed = transcript != self.transcript;
        self.transcript = transcript;

        let (roots, seen) = inserted_roots(&document, &self.seen);
        self.seen = seen;
        change.inserted = roots.len();
        for root in roots {
            let text: String = root.text().collect();
            if limit::is_limit_text(&text) {
                change.limit_seen = true;
                change.limit_reached_now |= self.limit.trigger(now);
            }
        }

        log::debug!(
            "snapshot: {} messages, {} inserted subtrees",
            self.transcript.len(),
            change.inserted
        );
        Some(change)
    }
}

/// Topmost elements of `document` that did not exist in the previous
/// snapshot, plus the key set for the next comparison.
///
/// An element is identified by its tag-and-sibling-index path under
/// `<body>`, its start tag and its own whitespace-collapsed text. Existing
/// elements are descended into; only new ones become roots.
fn inserted_roots<'a>(
    document: &'a Html,
    previous: &HashSet<u64>,
) -> (Vec<ElementRef<'a>>, HashSet<u64>) {
    let mut walk = Walk {
        previous,
        seen: HashSet::new(),
        roots: Vec::new(),
    };
    if let Some(body) = document.select(&BODY).next() {
        walk.children(body, 0, false);
    }
    (walk.roots, walk.seen)
}

struct Walk<'p, 'a> {
    previous: &'p HashSet<u64>,
    seen: HashSet<u64>,
    roots: Vec<ElementRef<'a>>,
}

impl<'a> Walk<'_, 'a> {
    fn children(&mut self, parent: ElementRef<'a>, parent_path: u64, inside_new: bool) {
        let elements = parent.children().filter_map(ElementRef::wrap);
        for (index, element) in elements.enumerate() {
            let path = path_key(parent_path, index, element);
            let key = element_key(path, element);
            self.seen.insert(key);
            let is_new = !inside_new && !self.previous.contains(&key);
            if is_new {
                self.roots.push(element);
            }
            self.children(element, path, inside_new || is_new);
        }
    }
}

fn path_key(parent_path: u64, index: usize, element: ElementRef<'_>) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent_path.hash(&mut hasher);
    index.hash(&mut hasher);
    element.value().name().hash(&mut hasher);
    hasher.finish()
}

fn element_key(path: u64, element: ElementRef<'_>) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    for (name, value) in element.value().attrs() {
        name.hash(&mut hasher);
        value.hash(&mut hasher);
    }
    for child in element.children() {
        if let Node::Text(text) = child.value() {
            for word in text.split_whitespace() {
                word.hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

fn hash_of(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
