//! Stale-response guard.
//!
//! Each request takes a [`Ticket`]. Taking a new ticket cancels the previous
//! one, and a result may only be applied while its ticket is still current,
//! so a slow superseded response can never overwrite a newer one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    token: CancellationToken,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a newer ticket has been issued.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[derive(Debug, Default)]
pub struct LatestOnly {
    current: Mutex<(u64, CancellationToken)>,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, (u64, CancellationToken)> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Supersedes the outstanding ticket, if any, and issues a new one.
    pub fn begin(&self) -> Ticket {
        let mut current = self.lock();
        current.1.cancel();
        current.0 += 1;
        current.1 = CancellationToken::new();
        Ticket {
            generation: current.0,
            token: current.1.clone(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let current = self.lock();
        current.0 == ticket.generation && !ticket.token.is_cancelled()
    }

    /// Cancels the outstanding ticket without issuing a new one.
    pub fn cancel(&self) {
        let mut current = self.lock();
        current.1.cancel();
        current.0 += 1;
    }
}

/// One [`LatestOnly`] per key, e.g. per signed-in user.
#[derive(Debug, Default)]
pub struct LatestByKey {
    slots: Mutex<HashMap<String, Arc<LatestOnly>>>,
}

impl LatestByKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, key: &str) -> Arc<LatestOnly> {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(LatestOnly::new()))
            .clone()
    }

    pub fn begin(&self, key: &str) -> (Arc<LatestOnly>, Ticket) {
        let slot = self.slot(key);
        let ticket = slot.begin();
        (slot, ticket)
    }

    pub fn forget(&self, key: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(slot) = slots.remove(key) {
            slot.cancel();
        }
    }
}
