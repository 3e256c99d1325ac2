use dashmap::DashMap;

use crate::config::SessionSeed;

/// Session state behind one bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub user_id: String,
    /// Universe the session is currently acting within.
    pub universe_id: Option<String>,
}

/// Resolves bearer tokens to sessions. Issuing tokens happens elsewhere.
pub trait SessionStore: Send + Sync {
    fn resolve(&self, token: &str) -> Option<SessionEntry>;

    /// Switch the session's current universe. Returns false for unknown tokens.
    fn set_universe(&self, token: &str, universe_id: Option<String>) -> bool;

    /// Drop every session of a user. Returns how many were removed.
    fn revoke_user(&self, user_id: &str) -> usize;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: &[SessionSeed]) -> Self {
        let this = Self::new();
        for s in seeds {
            this.insert(
                s.token.clone(),
                SessionEntry { user_id: s.user_id.clone(), universe_id: s.universe_id.clone() },
            );
        }
        this
    }

    pub fn insert(&self, token: impl Into<String>, entry: SessionEntry) {
        self.sessions.insert(token.into(), entry);
    }
}

impl SessionStore for InMemorySessionStore {
    fn resolve(&self, token: &str) -> Option<SessionEntry> {
        self.sessions.get(token).map(|r| r.value().clone())
    }

    fn set_universe(&self, token: &str, universe_id: Option<String>) -> bool {
        match self.sessions.get_mut(token) {
            Some(mut e) => {
                e.universe_id = universe_id;
                true
            }
            None => false,
        }
    }

    fn revoke_user(&self, user_id: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, e| e.user_id != user_id);
        before - self.sessions.len()
    }
}
