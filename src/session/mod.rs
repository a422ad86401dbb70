pub mod store;
pub mod types;

pub use store::{ConversationStore, HistoryCheckpoint, IdentityGuard, MAX_HISTORY_LIMIT};
pub use types::{
    ConversationEntry, ConversationHistory, HistoryKind, Role, join_contents, join_user_contents,
};
