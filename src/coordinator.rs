//! Popup-side orchestration shared by the GUI and the command line.
//!
//! The coordinator only talks to the other contexts through [`Messenger`];
//! failures are logged and turned into defaults, never passed on as
//! structured errors.

use crate::clipboard::{copy_with_fallback, ClipboardSink, CopyOutcome};
use crate::error::{MessagingError, PlatformError};
use crate::message::{ConversationSnapshot, PageStatus, Transcript};
use crate::messaging::{Messenger, Request, Response};
use crate::platform::{Navigator, Platform};
use crate::store::SavedConversation;
use crate::token_count::count_tokens;
use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_secs(2);

/// Shown when the page context cannot be reached.
pub const LOAD_ERROR: &str = "Unable to load conversation. Make sure you're on a chat page.";

/// Transient confirmation message.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            shown_at: now,
        }
    }

    /// Opacity from 1.0 down to 0.0 over [`TOAST_TTL`]; `None` once expired.
    pub fn alpha(&self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.shown_at);
        if elapsed >= TOAST_TTL {
            None
        } else {
            Some(1.0 - elapsed.as_secs_f32() / TOAST_TTL.as_secs_f32())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub messages: usize,
    pub summary_chars: usize,
    pub summary_tokens: usize,
}

impl Stats {
    pub fn of(snapshot: &ConversationSnapshot) -> Self {
        Self {
            messages: snapshot.conversation.len(),
            summary_chars: snapshot.summary.chars().count(),
            summary_tokens: count_tokens(&snapshot.summary),
        }
    }
}

pub struct Coordinator<M: Messenger> {
    messenger: M,
}

impl<M: Messenger> Coordinator<M> {
    pub fn new(messenger: M) -> Self {
        Self { messenger }
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn messenger_mut(&mut self) -> &mut M {
        &mut self.messenger
    }

    /// Asks the page context for the current transcript and summary.
    pub fn load(&mut self) -> Result<ConversationSnapshot, MessagingError> {
        match self.messenger.send(Request::GetConversation) {
            Ok(Response::Snapshot(snapshot)) => {
                log::info!(
                    "{} messages, status: {}",
                    snapshot.conversation.len(),
                    PageStatus::of(&snapshot).label()
                );
                Ok(snapshot)
            }
            Ok(_) => Err(MessagingError::UnexpectedResponse("getConversation")),
            Err(err) => {
                log::error!("Error loading conversation: {}", err);
                Err(err)
            }
        }
    }

    /// Hands the conversation to the background for a later transfer.
    pub fn stash(&mut self, snapshot: &ConversationSnapshot) -> bool {
        let request = Request::OpenTransferPopup {
            conversation: snapshot.conversation.clone(),
            is_limit_reached: snapshot.is_limit_reached,
        };
        match self.messenger.send(request) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("could not stash conversation: {}", err);
                false
            }
        }
    }

    pub fn summarize(&mut self, conversation: Transcript) -> String {
        match self
            .messenger
            .send(Request::GenerateSummary { conversation })
        {
            Ok(Response::Summary(summary)) => summary,
            Ok(_) => String::new(),
            Err(err) => {
                log::warn!("summary generation failed: {}", err);
                String::new()
            }
        }
    }

    /// Returns the new id, or `None` if saving failed.
    pub fn save(&mut self, conversation: Transcript) -> Option<String> {
        match self
            .messenger
            .send(Request::SaveConversation { conversation })
        {
            Ok(Response::Saved { id }) => Some(id),
            Ok(_) => None,
            Err(err) => {
                log::error!("Error saving conversation: {}", err);
                None
            }
        }
    }

    /// Saved conversations, newest first; empty when storage is unreachable.
    pub fn stored(&mut self) -> Vec<SavedConversation> {
        match self.messenger.send(Request::GetStoredConversations) {
            Ok(Response::Conversations(list)) => list,
            Ok(_) => Vec::new(),
            Err(err) => {
                log::error!("Error getting stored conversations: {}", err);
                Vec::new()
            }
        }
    }
}

pub fn copy_summary(
    primary: &mut dyn ClipboardSink,
    fallback: &mut dyn ClipboardSink,
    summary: &str,
) -> CopyOutcome {
    let outcome = copy_with_fallback(primary, fallback, summary);
    if outcome == CopyOutcome::Failed {
        log::warn!("summary could not be copied");
    }
    outcome
}

/// Copies the summary, then opens the destination. A failed copy does not
/// stop the navigation; closing the popup is left to the caller.
pub fn open_platform(
    primary: &mut dyn ClipboardSink,
    fallback: &mut dyn ClipboardSink,
    navigator: &mut dyn Navigator,
    summary: &str,
    platform: &Platform,
) -> Result<CopyOutcome, PlatformError> {
    let outcome = copy_summary(primary, fallback, summary);
    navigator.open(platform.url())?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;
    use crate::message::Message;
    use crate::messaging::{Background, LocalRuntime, PageContext};
    use crate::source::StaticSource;
    use crate::store::ConversationStore;
    use crate::summary::SummaryStyle;

    #[derive(Default)]
    struct RecordingNavigator {
        opened: Vec<String>,
    }

    impl Navigator for RecordingNavigator {
        fn open(&mut self, url: &str) -> Result<(), PlatformError> {
            self.opened.push(url.to_string());
            Ok(())
        }
    }

    fn coordinator(html: Option<&str>) -> Coordinator<LocalRuntime> {
        let background = Background::new(ConversationStore::in_memory(), SummaryStyle::default());
        let page = html.map(|html| {
            PageContext::with_source(
                Box::new(StaticSource {
                    label: "test".into(),
                    html: html.into(),
                }),
                SummaryStyle::default(),
            )
        });
        Coordinator::new(LocalRuntime::new(background, page))
    }

    #[test]
    fn load_reports_live_conversation() {
        let mut coordinator = coordinator(Some(
            r#"<div class="message user">How to fix this bug in my python function?</div>
               <div class="message">Try checking line 5 for a syntax error.</div>"#,
        ));
        let snapshot = coordinator.load().unwrap();
        assert_eq!(PageStatus::of(&snapshot), PageStatus::Live);
        assert_eq!(snapshot.conversation[1].role, crate::message::Role::Assistant);
        let stats = Stats::of(&snapshot);
        assert_eq!(stats.messages, 2);
        assert_eq!(stats.summary_chars, snapshot.summary.chars().count());
        assert!(stats.summary_tokens > 0);
    }

    #[test]
    fn empty_page_is_absent_not_an_error() {
        let mut coordinator = coordinator(Some("<p>Log in to continue</p>"));
        let snapshot = coordinator.load().unwrap();
        assert_eq!(PageStatus::of(&snapshot), PageStatus::Absent);
        assert!(snapshot.summary.is_empty());
    }

    #[test]
    fn load_without_page_fails() {
        let mut coordinator = coordinator(None);
        assert!(coordinator.load().is_err());
    }

    #[test]
    fn save_and_list_round_through_background() {
        let mut coordinator = coordinator(None);
        for i in 0..12 {
            assert!(coordinator
                .save(vec![Message::user(format!("conversation {i}"))])
                .is_some());
        }
        let stored = coordinator.stored();
        assert_eq!(stored.len(), 10);
        assert_eq!(stored[0].preview, "conversation 11");
    }

    #[test]
    fn summarize_uses_background() {
        let mut coordinator = coordinator(None);
        let summary = coordinator.summarize(vec![Message::user("debug my algorithm")]);
        assert!(summary.starts_with("TECHNICAL CONVERSATION TRANSFER"));
        assert!(coordinator.summarize(Vec::new()).is_empty());
    }

    #[test]
    fn stash_records_current_conversation() {
        let mut coordinator = coordinator(None);
        let snapshot = ConversationSnapshot {
            conversation: vec![Message::user("hi")],
            summary: String::new(),
            is_limit_reached: true,
        };
        assert!(coordinator.stash(&snapshot));
        let area = coordinator.messenger().background.store().area();
        assert!(area.is_limit_reached);
    }

    #[test]
    fn open_platform_copies_before_navigating_even_if_copy_fails() {
        let mut primary = MemoryClipboard {
            broken: true,
            ..Default::default()
        };
        let mut fallback = MemoryClipboard {
            broken: true,
            ..Default::default()
        };
        let mut navigator = RecordingNavigator::default();
        let outcome = open_platform(
            &mut primary,
            &mut fallback,
            &mut navigator,
            "summary",
            &Platform::Claude,
        )
        .unwrap();
        assert_eq!(outcome, CopyOutcome::Failed);
        assert_eq!(navigator.opened, vec!["https://claude.ai"]);
    }

    #[test]
    fn toast_fades_and_expires() {
        let start = Instant::now();
        let toast = Toast::new("Summary copied to clipboard!", start);
        assert_eq!(toast.alpha(start), Some(1.0));
        assert!(toast.alpha(start + Duration::from_secs(1)).unwrap() < 1.0);
        assert!(toast.alpha(start + TOAST_TTL).is_none());
    }
}
