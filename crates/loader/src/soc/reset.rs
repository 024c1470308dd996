//! Reset callback table.

use std::sync::Arc;

use super::traits::{ResetAction, ResetRegistry, ResetToken};

/// `ResetRegistry` preserving registration order.
#[derive(Debug, Default)]
pub struct ResetTable {
    entries: Vec<(ResetToken, Arc<dyn ResetAction>)>,
    next_token: u64,
}

impl ResetTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered actions, oldest first.
    pub fn actions(&self) -> Vec<Arc<dyn ResetAction>> {
        self.entries.iter().map(|(_, a)| Arc::clone(a)).collect()
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `token` is currently registered.
    pub fn contains(&self, token: ResetToken) -> bool {
        self.entries.iter().any(|(t, _)| *t == token)
    }
}

impl ResetRegistry for ResetTable {
    fn register(&mut self, action: Arc<dyn ResetAction>) -> ResetToken {
        let token = ResetToken(self.next_token);
        self.next_token += 1;
        self.entries.push((token, action));
        token
    }

    fn unregister(&mut self, token: ResetToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != token);
        self.entries.len() != before
    }
}
