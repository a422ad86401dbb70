use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Which of an identity's two rolling logs an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HistoryKind {
    /// User/assistant turns of the delegation flow.
    Conversation,
    /// Turns fed to the contextual reviewer.
    Guardian,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

impl ConversationEntry {
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

/// Snapshot of one identity's histories at the time of the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    pub conversation: Vec<ConversationEntry>,
    pub guardian: Vec<ConversationEntry>,
}

impl ConversationHistory {
    pub fn entries(&self, kind: HistoryKind) -> &[ConversationEntry] {
        match kind {
            HistoryKind::Conversation => &self.conversation,
            HistoryKind::Guardian => &self.guardian,
        }
    }
}

/// Join every entry's content with newlines, in insertion order.
pub fn join_contents(entries: &[ConversationEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join only user-role contents with newlines, in insertion order.
pub fn join_user_contents(entries: &[ConversationEntry]) -> String {
    entries
        .iter()
        .filter(|entry| entry.role == Role::User)
        .map(|entry| entry.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
