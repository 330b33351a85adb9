/// Reduction failures.
///
/// Every variant is fatal for the reduction that produced it: the snapshot
/// is not computed and the caller decides what to do.

use alloy_primitives::Address;
use thiserror::Error;

use crate::events::OrderKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// An event kind outside the model's closed set, or one whose arguments
    /// could not be decoded.
    #[error("malformed {kind} event: {reason}")]
    MalformedEvent { kind: String, reason: String },

    /// A revoke for an account that does not currently hold the role.
    #[error("can't revoke ungranted role {role} from {account}")]
    InconsistentState { role: String, account: Address },

    #[error("two events share order key {0}")]
    DuplicateOrderKey(OrderKey),

    #[error("event at {found} arrived after {previous}, input is not in stream order")]
    OutOfOrder { previous: OrderKey, found: OrderKey },
}

impl ReduceError {
    pub fn malformed(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        ReduceError::MalformedEvent {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}
