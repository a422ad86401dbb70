use super::types::{ConversationEntry, ConversationHistory, HistoryKind, Role};
use crate::config::SessionConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OwnedMutexGuard;

/// Upper bound on every history, whatever the configured limit.
pub const MAX_HISTORY_LIMIT: usize = 10;

/// Process-wide store of per-identity rolling histories.
///
/// Created once at startup and shared by `Arc` with every component that
/// reads or appends history. Identities are created lazily on first access.
/// Every history is bounded to `history_limit` entries (at most
/// [`MAX_HISTORY_LIMIT`]); the oldest entry is evicted first.
pub struct ConversationStore {
    history_limit: usize,
    identities: Mutex<HashMap<String, Arc<IdentitySlot>>>,
}

struct IdentitySlot {
    /// Held by the delegation flow for a whole request.
    request_lock: Arc<tokio::sync::Mutex<()>>,
    histories: Mutex<Histories>,
}

struct Histories {
    conversation: VecDeque<ConversationEntry>,
    guardian: VecDeque<ConversationEntry>,
    last_touched: Instant,
}

impl Histories {
    fn new() -> Self {
        Self {
            conversation: VecDeque::new(),
            guardian: VecDeque::new(),
            last_touched: Instant::now(),
        }
    }

    fn log_mut(&mut self, kind: HistoryKind) -> &mut VecDeque<ConversationEntry> {
        match kind {
            HistoryKind::Conversation => &mut self.conversation,
            HistoryKind::Guardian => &mut self.guardian,
        }
    }

    fn log(&self, kind: HistoryKind) -> &VecDeque<ConversationEntry> {
        match kind {
            HistoryKind::Conversation => &self.conversation,
            HistoryKind::Guardian => &self.guardian,
        }
    }

    fn snapshot(&self) -> ConversationHistory {
        ConversationHistory {
            conversation: self.conversation.iter().cloned().collect(),
            guardian: self.guardian.iter().cloned().collect(),
        }
    }
}

/// Held for the duration of one request on an identity.
pub struct IdentityGuard {
    _request: OwnedMutexGuard<()>,
    _slot: Arc<IdentitySlot>,
}

/// Both histories of one identity captured before a request started.
#[derive(Debug, Clone)]
pub struct HistoryCheckpoint {
    identity: String,
    history: ConversationHistory,
}

impl HistoryCheckpoint {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}

impl ConversationStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit: history_limit.clamp(1, MAX_HISTORY_LIMIT),
            identities: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.history_limit)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    fn slot(&self, identity: &str) -> Arc<IdentitySlot> {
        let mut identities = self
            .identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            identities
                .entry(identity.to_string())
                .or_insert_with(|| {
                    tracing::debug!(identity = %identity, "session.created");
                    Arc::new(IdentitySlot {
                        request_lock: Arc::new(tokio::sync::Mutex::new(())),
                        histories: Mutex::new(Histories::new()),
                    })
                }),
        )
    }

    /// Snapshot both histories, creating an empty entry on first access.
    pub fn get_or_create(&self, identity: &str) -> ConversationHistory {
        let slot = self.slot(identity);
        let histories = slot.histories.lock().unwrap_or_else(PoisonError::into_inner);
        histories.snapshot()
    }

    /// Snapshot a single history.
    pub fn history(&self, identity: &str, kind: HistoryKind) -> Vec<ConversationEntry> {
        let slot = self.slot(identity);
        let histories = slot.histories.lock().unwrap_or_else(PoisonError::into_inner);
        histories.log(kind).iter().cloned().collect()
    }

    /// Append one entry and evict from the front down to `history_limit`.
    /// Returns the resulting length.
    pub fn append(
        &self,
        identity: &str,
        kind: HistoryKind,
        role: Role,
        content: impl Into<String>,
    ) -> usize {
        let slot = self.slot(identity);
        let mut histories = slot.histories.lock().unwrap_or_else(PoisonError::into_inner);
        histories.last_touched = Instant::now();
        let log = histories.log_mut(kind);
        log.push_back(ConversationEntry::new(role, content));
        while log.len() > self.history_limit {
            log.pop_front();
        }
        log.len()
    }

    /// What `kind` would contain after appending `entry`, without appending it.
    pub fn preview_append(
        &self,
        identity: &str,
        kind: HistoryKind,
        entry: ConversationEntry,
    ) -> Vec<ConversationEntry> {
        let mut entries = self.history(identity, kind);
        entries.push(entry);
        let excess = entries.len().saturating_sub(self.history_limit);
        entries.drain(..excess);
        entries
    }

    pub fn checkpoint(&self, identity: &str) -> HistoryCheckpoint {
        HistoryCheckpoint {
            identity: identity.to_string(),
            history: self.get_or_create(identity),
        }
    }

    /// Replace both histories of the checkpoint's identity with its contents.
    pub fn restore(&self, checkpoint: &HistoryCheckpoint) {
        let slot = self.slot(&checkpoint.identity);
        let mut histories = slot.histories.lock().unwrap_or_else(PoisonError::into_inner);
        histories.conversation = checkpoint.history.conversation.iter().cloned().collect();
        histories.guardian = checkpoint.history.guardian.iter().cloned().collect();
        histories.last_touched = Instant::now();
        tracing::debug!(identity = %checkpoint.identity, "session.restored");
    }

    /// Serialize requests for one identity. Other identities are unaffected.
    ///
    /// The guard keeps the identity's slot alive, so `evict_idle` cannot
    /// drop it between lookup and acquisition.
    pub async fn lock_identity(&self, identity: &str) -> IdentityGuard {
        let slot = self.slot(identity);
        let lock = Arc::clone(&slot.request_lock);
        IdentityGuard {
            _request: lock.lock_owned().await,
            _slot: slot,
        }
    }

    /// Drop identities idle for longer than `ttl` that have no request in flight.
    /// Returns the number of evicted identities.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut identities = self
            .identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = identities.len();
        identities.retain(|_, slot| {
            let idle = slot
                .histories
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last_touched
                .elapsed()
                > ttl;
            // The map holds one reference; any other is a request in flight
            // or a caller between lookup and lock.
            let busy = Arc::strong_count(slot) > 1;
            !idle || busy
        });
        let evicted = before - identities.len();
        if evicted > 0 {
            tracing::info!(evicted, "session.evicted_idle");
        }
        evicted
    }

    pub fn identity_count(&self) -> usize {
        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
