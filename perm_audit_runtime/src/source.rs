//! Event source collaborator.
//!
//! The runtime never talks to a node itself. An `EventSource` hands back
//! the decoded logs of one contract for a set of event names; pagination,
//! retries and timeouts are its own business. Its errors reach the caller
//! unchanged.
//!
//! Two offline implementations are provided:
//!   - `MemorySource`: events held in memory, keyed by contract
//!   - `JsonDirSource`: one `<address>.json` file per contract, each a JSON
//!     array of `RawEvent`

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use alloy_primitives::{hex, Address};
use thiserror::Error;
use tracing::debug;

use crate::raw::RawEvent;

pub trait EventSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All events of `contract` whose name is in `kinds`, in any order.
    fn fetch(&self, contract: Address, kinds: &[&str]) -> Result<Vec<RawEvent>, Self::Error>;
}

impl<T: EventSource + ?Sized> EventSource for &T {
    type Error = T::Error;

    fn fetch(&self, contract: Address, kinds: &[&str]) -> Result<Vec<RawEvent>, Self::Error> {
        (**self).fetch(contract, kinds)
    }
}

fn keep_kinds(events: impl IntoIterator<Item = RawEvent>, kinds: &[&str]) -> Vec<RawEvent> {
    events
        .into_iter()
        .filter(|evt| kinds.contains(&evt.event.as_str()))
        .collect()
}

// ── MemorySource ───────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    events: BTreeMap<Address, Vec<RawEvent>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, contract: Address, events: Vec<RawEvent>) -> Self {
        self.events.entry(contract).or_default().extend(events);
        self
    }
}

impl EventSource for MemorySource {
    type Error = Infallible;

    fn fetch(&self, contract: Address, kinds: &[&str]) -> Result<Vec<RawEvent>, Infallible> {
        let events = self.events.get(&contract).cloned().unwrap_or_default();
        Ok(keep_kinds(events, kinds))
    }
}

// ── JsonDirSource ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bad event file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// `<dir>/<lowercase 0x address>.json`
    pub fn path_for(&self, contract: Address) -> PathBuf {
        self.dir.join(format!("0x{}.json", hex::encode(contract)))
    }
}

impl EventSource for JsonDirSource {
    type Error = SourceError;

    fn fetch(&self, contract: Address, kinds: &[&str]) -> Result<Vec<RawEvent>, SourceError> {
        let path = self.path_for(contract);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no event file for contract");
                return Ok(Vec::new());
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        let events: Vec<RawEvent> =
            serde_json::from_str(&content).map_err(|source| SourceError::Json {
                path: path.clone(),
                source,
            })?;

        Ok(keep_kinds(events, kinds))
    }
}
