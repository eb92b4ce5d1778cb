//! Named actions exchanged between the page context, the background service
//! and the coordinator.
//!
//! Requests carry an `action` tag and camelCase fields so the same values
//! can travel over the native messaging host unchanged.

use crate::error::MessagingError;
use crate::message::{ConversationSnapshot, Transcript};
use crate::observer::PageObserver;
use crate::source::PageSource;
use crate::store::{ConversationStore, SavedConversation};
use crate::summary::{self, SummaryStyle};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    OpenTransferPopup {
        conversation: Transcript,
        #[serde(default)]
        is_limit_reached: bool,
    },
    SaveConversation {
        conversation: Transcript,
    },
    GetStoredConversations,
    GenerateSummary {
        conversation: Transcript,
    },
    GetConversation,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::OpenTransferPopup { .. } => "openTransferPopup",
            Request::SaveConversation { .. } => "saveConversation",
            Request::GetStoredConversations => "getStoredConversations",
            Request::GenerateSummary { .. } => "generateSummary",
            Request::GetConversation => "getConversation",
        }
    }
}

/// Response shapes, serialized without a wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Snapshot(ConversationSnapshot),
    Summary(String),
    Conversations(Vec<SavedConversation>),
    Saved { id: String },
    Ack { ok: bool },
}

/// Anything a request can be sent to.
pub trait Messenger {
    fn send(&mut self, request: Request) -> Result<Response, MessagingError>;
}

/// Owns storage and summary generation.
pub struct Background {
    store: ConversationStore,
    style: SummaryStyle,
}

impl Background {
    pub fn new(store: ConversationStore, style: SummaryStyle) -> Self {
        Self { store, style }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn style(&self) -> SummaryStyle {
        self.style
    }

    pub fn handle(&mut self, request: Request) -> Result<Response, MessagingError> {
        match request {
            Request::OpenTransferPopup {
                conversation,
                is_limit_reached,
            } => {
                self.store
                    .set_current(conversation, is_limit_reached, Utc::now())?;
                Ok(Response::Ack { ok: true })
            }
            Request::SaveConversation { conversation } => {
                let id = self.store.save_conversation(conversation, Utc::now())?;
                Ok(Response::Saved { id })
            }
            // Reads come from the in-memory copy; a store that opened
            // successfully always has a list, possibly empty.
            Request::GetStoredConversations => {
                Ok(Response::Conversations(self.store.saved().to_vec()))
            }
            Request::GenerateSummary { conversation } => Ok(Response::Summary(
                summary::summarize_with(self.style, &conversation),
            )),
            Request::GetConversation => Err(MessagingError::Unsupported("getConversation")),
        }
    }
}

/// The page-side end: owns the observer and answers `getConversation`.
pub struct PageContext {
    observer: PageObserver,
    source: Option<Box<dyn PageSource>>,
    style: SummaryStyle,
}

impl PageContext {
    /// A context that re-reads `source` whenever it is asked for the page.
    pub fn with_source(source: Box<dyn PageSource>, style: SummaryStyle) -> Self {
        Self {
            observer: PageObserver::new(),
            source: Some(source),
            style,
        }
    }

    /// A context fed externally through [`PageContext::observer_mut`].
    pub fn detached(style: SummaryStyle) -> Self {
        Self {
            observer: PageObserver::new(),
            source: None,
            style,
        }
    }

    pub fn observer(&self) -> &PageObserver {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut PageObserver {
        &mut self.observer
    }

    pub fn location(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.location())
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let conversation = self.observer.transcript().clone();
        ConversationSnapshot {
            summary: summary::summarize_with(self.style, &conversation),
            conversation,
            is_limit_reached: self.observer.limit().is_reached(),
        }
    }

    pub fn handle(&mut self, request: Request) -> Result<Response, MessagingError> {
        match request {
            Request::GetConversation => {
                if let Some(source) = self.source.as_mut() {
                    let html = source.fetch()?;
                    self.observer.ingest(&html, Instant::now());
                }
                Ok(Response::Snapshot(self.snapshot()))
            }
            other => Err(MessagingError::Unsupported(other.action())),
        }
    }
}

/// In-process runtime routing each action to the context that owns it.
pub struct LocalRuntime {
    pub background: Background,
    pub page: Option<PageContext>,
}

impl LocalRuntime {
    pub fn new(background: Background, page: Option<PageContext>) -> Self {
        Self { background, page }
    }
}

impl Messenger for LocalRuntime {
    fn send(&mut self, request: Request) -> Result<Response, MessagingError> {
        log::debug!("dispatching {}", request.action());
        match request {
            Request::GetConversation => match self.page.as_mut() {
                Some(page) => page.handle(request),
                None => Err(MessagingError::NoReceiver("getConversation")),
            },
            other => self.background.handle(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::source::StaticSource;

    const PAGE: &str = r#"<body>
        <div data-message-author-role="user">Write a story about a dragon</div>
        <div data-message-author-role="assistant">Once upon a time...</div>
        <div class="banner">Too many requests</div>
    </body>"#;

    fn runtime(with_page: bool) -> LocalRuntime {
        let background = Background::new(ConversationStore::in_memory(), SummaryStyle::default());
        let page = with_page.then(|| {
            PageContext::with_source(
                Box::new(StaticSource {
                    label: "test".into(),
                    html: PAGE.into(),
                }),
                SummaryStyle::default(),
            )
        });
        LocalRuntime::new(background, page)
    }

    #[test]
    fn requests_use_action_tags() {
        let json = r#"{"action":"openTransferPopup","conversation":[{"role":"user","content":"hi"}],"isLimitReached":true}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            Request::OpenTransferPopup {
                conversation: vec![Message::user("hi")],
                is_limit_reached: true,
            }
        );
        let request: Request = serde_json::from_str(r#"{"action":"getStoredConversations"}"#).unwrap();
        assert_eq!(request, Request::GetStoredConversations);
        assert_eq!(
            serde_json::to_string(&Request::GetConversation).unwrap(),
            r#"{"action":"getConversation"}"#
        );
    }

    #[test]
    fn get_conversation_reads_the_page() {
        let mut runtime = runtime(true);
        let Response::Snapshot(snapshot) = runtime.send(Request::GetConversation).unwrap() else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.conversation.len(), 2);
        assert!(snapshot.is_limit_reached);
        assert!(snapshot.summary.starts_with("CREATIVE PROJECT TRANSFER"));

        let json = serde_json::to_value(Response::Snapshot(snapshot)).unwrap();
        assert_eq!(json["isLimitReached"], true);
    }

    #[test]
    fn missing_page_context_is_an_error() {
        let mut runtime = runtime(false);
        assert!(matches!(
            runtime.send(Request::GetConversation),
            Err(MessagingError::NoReceiver(_))
        ));
    }

    #[test]
    fn save_then_list() {
        let mut runtime = runtime(false);
        let saved = runtime
            .send(Request::SaveConversation {
                conversation: vec![Message::user("keep this")],
            })
            .unwrap();
        assert!(matches!(saved, Response::Saved { .. }));

        let Response::Conversations(list) = runtime.send(Request::GetStoredConversations).unwrap()
        else {
            panic!("expected a list");
        };
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].preview, "keep this");
    }

    #[test]
    fn open_transfer_popup_stashes_current_conversation() {
        let mut runtime = runtime(false);
        let response = runtime
            .send(Request::OpenTransferPopup {
                conversation: vec![Message::user("carry over")],
                is_limit_reached: true,
            })
            .unwrap();
        assert_eq!(response, Response::Ack { ok: true });
        let area = runtime.background.store().area();
        assert_eq!(area.current_conversation.as_ref().unwrap().len(), 1);
        assert!(area.is_limit_reached);
        assert!(area.timestamp.is_some());
    }

    #[test]
    fn generate_summary_serializes_as_plain_string() {
        let mut runtime = runtime(false);
        let response = runtime
            .send(Request::GenerateSummary {
                conversation: vec![Message::user("debug this code")],
            })
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json
            .as_str()
            .unwrap()
            .starts_with("TECHNICAL CONVERSATION TRANSFER"));
    }

    #[test]
    fn background_does_not_answer_page_requests() {
        let mut background = Background::new(ConversationStore::in_memory(), SummaryStyle::Digest);
        assert!(matches!(
            background.handle(Request::GetConversation),
            Err(MessagingError::Unsupported("getConversation"))
        ));
    }
}
