//! Replay orchestrator — rebuild snapshots from ordered event lists.
//!
//! Delegates all folding to the kernel. No shortcuts, no cached state.

use perm_audit_kernel::domain::{ManagerSnapshot, MembershipSnapshot};
use perm_audit_kernel::engine::{reduce_access_control, reduce_access_manager};
use perm_audit_kernel::error::ReduceError;
use perm_audit_kernel::events::{ControlEvent, ManagerEvent, Ordered};
use perm_audit_kernel::hashing::{manager_fingerprint, membership_fingerprint};
use perm_audit_kernel::roles::Registry;

/// Rebuild the AccessControl membership from a role-ordered stream.
/// Returns `(snapshot, fingerprint)`.
pub fn rebuild_access_control(
    events: &[Ordered<ControlEvent>],
    registry: &Registry,
) -> Result<(MembershipSnapshot, String), ReduceError> {
    let snapshot = reduce_access_control(events, registry)?;
    let fingerprint = membership_fingerprint(&snapshot);
    Ok((snapshot, fingerprint))
}

/// Rebuild the AccessManager roles from a chronological stream.
/// Returns `(snapshot, fingerprint)`.
pub fn rebuild_access_manager(
    events: &[Ordered<ManagerEvent>],
) -> Result<(ManagerSnapshot, String), ReduceError> {
    let snapshot = reduce_access_manager(events)?;
    let fingerprint = manager_fingerprint(&snapshot);
    Ok((snapshot, fingerprint))
}
