use serde::{Deserialize, Serialize};
use std::fmt;

/// Who wrote a message. Inferred from page markup, so it can be wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Uppercase label used in summary context lines ("USER: ...").
    pub fn shout(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Messages in page order. Rebuilt from scratch on every extraction.
pub type Transcript = Vec<Message>;

/// What the page context hands back for `getConversation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub conversation: Transcript,
    pub summary: String,
    pub is_limit_reached: bool,
}

/// Tri-state shown by the popup status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    LimitReached,
    Live,
    Absent,
}

impl PageStatus {
    pub fn of(snapshot: &ConversationSnapshot) -> Self {
        if snapshot.is_limit_reached {
            PageStatus::LimitReached
        } else if !snapshot.conversation.is_empty() {
            PageStatus::Live
        } else {
            PageStatus::Absent
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PageStatus::LimitReached => "Message limit reached",
            PageStatus::Live => "Conversation detected",
            PageStatus::Absent => "No conversation found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let snapshot = ConversationSnapshot {
            conversation: vec![Message::user("a")],
            summary: "s".into(),
            is_limit_reached: true,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["isLimitReached"], true);
        assert_eq!(value["conversation"][0]["role"], "user");
    }

    #[test]
    fn status_prefers_limit_over_live() {
        let mut snapshot = ConversationSnapshot {
            conversation: vec![Message::user("a")],
            ..Default::default()
        };
        assert_eq!(PageStatus::of(&snapshot), PageStatus::Live);
        snapshot.is_limit_reached = true;
        assert_eq!(PageStatus::of(&snapshot), PageStatus::LimitReached);
        snapshot.is_limit_reached = false;
        snapshot.conversation.clear();
        assert_eq!(PageStatus::of(&snapshot), PageStatus::Absent);
    }
}
