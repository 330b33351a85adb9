/// Invariant Checks
///
/// Structural validation for snapshots that did not come out of the
/// reducer, e.g. a stored reference loaded from disk. Returns the first
/// failure found.
///
/// A stored reference may omit any role, the built-ins included; a role
/// absent from the reference is compared against its on-chain defaults.

use thiserror::Error;

use crate::domain::ManagerSnapshot;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("[INVARIANT:role_id_key] role stored under key {key} carries id {id}")]
    RoleIdMismatch { key: u64, id: u64 },
}

/// Run all checks on `snapshot`.
pub fn validate_snapshot(snapshot: &ManagerSnapshot) -> Result<(), InvariantError> {
    check_role_id_keys(snapshot)
}

/// Every record is stored under its own id.
fn check_role_id_keys(snapshot: &ManagerSnapshot) -> Result<(), InvariantError> {
    for (key, role) in &snapshot.roles {
        if *key != role.id {
            return Err(InvariantError::RoleIdMismatch {
                key: *key,
                id: role.id,
            });
        }
    }
    Ok(())
}
