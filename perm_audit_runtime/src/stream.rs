//! Event streams — one per permission model.
//!
//! A stream fetches, decodes and orders its contract's events the first
//! time it is read and serves every later read from that list.
//!
//! Concurrency: the fill runs under a Mutex. The first caller loads, any
//! concurrent caller blocks and then sees the same `Arc`. A failed load
//! caches nothing.

use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::Address;
use thiserror::Error;
use tracing::info;

use perm_audit_kernel::domain::{ManagerSnapshot, MembershipSnapshot, Operation};
use perm_audit_kernel::engine::{reduce_access_control, reduce_access_manager};
use perm_audit_kernel::error::ReduceError;
use perm_audit_kernel::events::{
    order_by_role, order_chronologically, ControlEvent, ManagerEvent, Ordered,
};
use perm_audit_kernel::roles::Registry;

use crate::bridge::{decode_control, decode_manager};
use crate::reconcile;
use crate::source::EventSource;

#[derive(Debug, Error)]
pub enum StreamError<E: std::error::Error + 'static> {
    /// The event source failed; its error is passed through untouched.
    #[error(transparent)]
    Source(E),

    #[error(transparent)]
    Reduce(#[from] ReduceError),
}

pub type EventList<E> = Arc<Vec<Ordered<E>>>;

/// Load-once cell shared by both stream kinds.
struct Memo<E> {
    cache: Mutex<Option<EventList<E>>>,
}

impl<E> Memo<E> {
    fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    fn get_or_load<Err, F>(&self, load: F) -> Result<EventList<E>, Err>
    where
        F: FnOnce() -> Result<Vec<Ordered<E>>, Err>,
    {
        // The cache only ever holds a complete list, so a poisoned lock
        // is still safe to read.
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(events) = cache.as_ref() {
            return Ok(Arc::clone(events));
        }
        let events = Arc::new(load()?);
        *cache = Some(Arc::clone(&events));
        Ok(events)
    }

    fn is_loaded(&self) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

// ── AccessControl ──────────────────────────────────────────────

/// Stream of an OpenZeppelin `AccessControl` contract, ordered by role hash
/// then chronologically.
pub struct AccessControlStream<S> {
    contract: Address,
    source: S,
    memo: Memo<ControlEvent>,
}

impl<S: EventSource> AccessControlStream<S> {
    pub fn new(contract: Address, source: S) -> Self {
        Self {
            contract,
            source,
            memo: Memo::new(),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn is_loaded(&self) -> bool {
        self.memo.is_loaded()
    }

    pub fn stream(&self) -> Result<EventList<ControlEvent>, StreamError<S::Error>> {
        self.memo.get_or_load(|| -> Result<_, StreamError<S::Error>> {
            let raw = self
                .source
                .fetch(self.contract, &ControlEvent::KINDS)
                .map_err(StreamError::Source)?;
            let events = raw
                .iter()
                .map(decode_control)
                .collect::<Result<Vec<_>, _>>()?;
            let events = order_by_role(events)?;
            info!(contract = %self.contract, events = events.len(), "loaded AccessControl stream");
            Ok(events)
        })
    }

    pub fn snapshot(&self, registry: &Registry) -> Result<MembershipSnapshot, StreamError<S::Error>> {
        let events = self.stream()?;
        Ok(reduce_access_control(&events, registry)?)
    }
}

// ── AccessManager ──────────────────────────────────────────────

/// Stream of an OpenZeppelin `AccessManager` contract in global
/// chronological order.
pub struct AccessManagerStream<S> {
    contract: Address,
    source: S,
    memo: Memo<ManagerEvent>,
}

impl<S: EventSource> AccessManagerStream<S> {
    pub fn new(contract: Address, source: S) -> Self {
        Self {
            contract,
            source,
            memo: Memo::new(),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn is_loaded(&self) -> bool {
        self.memo.is_loaded()
    }

    pub fn stream(&self) -> Result<EventList<ManagerEvent>, StreamError<S::Error>> {
        self.memo.get_or_load(|| -> Result<_, StreamError<S::Error>> {
            let raw = self
                .source
                .fetch(self.contract, &ManagerEvent::KINDS)
                .map_err(StreamError::Source)?;
            let events = raw
                .iter()
                .map(decode_manager)
                .collect::<Result<Vec<_>, _>>()?;
            let events = order_chronologically(events)?;
            info!(contract = %self.contract, events = events.len(), "loaded AccessManager stream");
            Ok(events)
        })
    }

    pub fn snapshot(&self) -> Result<ManagerSnapshot, StreamError<S::Error>> {
        let events = self.stream()?;
        Ok(reduce_access_manager(&events)?)
    }

    /// Operations that bring `reference` to the live state.
    pub fn compare(&self, reference: &ManagerSnapshot) -> Result<Vec<Operation>, StreamError<S::Error>> {
        let live = self.snapshot()?;
        Ok(reconcile::compare(&live, reference))
    }
}
