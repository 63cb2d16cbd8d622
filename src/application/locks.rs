use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

use crate::domain::CardId;

use super::LedgerError;

/// Bounded wait for a card lock. Past this, the caller gets a retryable
/// contention error instead of hanging.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

/// Per-card lock registry serializing balance mutations.
///
/// Every deposit or withdrawal holds its card's lock across the whole
/// read-check-write; a transfer holds both cards' locks, always acquired in
/// ascending card-id order so two transfers over the same pair in opposite
/// directions cannot deadlock.
#[derive(Default)]
pub struct CardLocks {
    locks: Mutex<HashMap<CardId, Arc<Mutex<()>>>>,
}

/// Guard(s) held for the duration of one ledger operation.
#[derive(Debug)]
pub struct CardGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl CardLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, card_id: CardId) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().await;
        map.entry(card_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn acquire(&self, card_id: CardId) -> Result<OwnedMutexGuard<()>, LedgerError> {
        let lock = self.entry(card_id).await;
        timeout(LOCK_WAIT, lock.lock_owned())
            .await
            .map_err(|_| LedgerError::Contention(card_id.to_string()))
    }

    /// Lock a single card.
    pub async fn lock_card(&self, card_id: CardId) -> Result<CardGuard, LedgerError> {
        let guard = self.acquire(card_id).await?;
        Ok(CardGuard {
            _guards: vec![guard],
        })
    }

    /// Lock a pair of distinct cards in ascending id order.
    pub async fn lock_pair(&self, a: CardId, b: CardId) -> Result<CardGuard, LedgerError> {
        debug_assert_ne!(a, b, "lock_pair requires distinct cards");
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await?;
        let second_guard = self.acquire(second).await?;
        Ok(CardGuard {
            _guards: vec![first_guard, second_guard],
        })
    }
}
