//! Raw event records as delivered by an event source.
//!
//! Arguments are already ABI-decoded: addresses, hashes and selectors are
//! hex strings, integers are JSON numbers (or decimal strings when they do
//! not fit the source's number type).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use perm_audit_kernel::error::ReduceError;
use perm_audit_kernel::events::OrderKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Event name, e.g. `RoleGranted`.
    pub event: String,
    pub args: Map<String, Value>,
    pub block_number: u64,
    pub log_index: u64,
}

impl RawEvent {
    pub fn new(event: &str, args: Map<String, Value>, block_number: u64, log_index: u64) -> Self {
        Self {
            event: event.to_string(),
            args,
            block_number,
            log_index,
        }
    }

    /// Build from a JSON value; `args` must be an object.
    pub fn from_value(
        event: &str,
        args: Value,
        block_number: u64,
        log_index: u64,
    ) -> Result<Self, ReduceError> {
        match args {
            Value::Object(map) => Ok(Self::new(event, map, block_number, log_index)),
            other => Err(ReduceError::malformed(
                event,
                format!("arguments must be a JSON object, got {other}"),
            )),
        }
    }

    pub fn order(&self) -> OrderKey {
        OrderKey::new(self.block_number, self.log_index)
    }
}
