//! Reconciliation — the operations that move a stored reference snapshot
//! forward to the live AccessManager state, and determinism verification.
//!
//! Only roles present in the live snapshot are visited. A deployed role
//! cannot be deleted, so reference-only roles produce nothing.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use perm_audit_kernel::domain::{
    is_builtin_role, ManagedRole, ManagerSnapshot, Operation, ADMIN_ROLE_ID,
};
use perm_audit_kernel::error::ReduceError;
use perm_audit_kernel::events::{ControlEvent, ManagerEvent, Ordered};
use perm_audit_kernel::roles::Registry;

use crate::replay;

/// Compare `live` against `reference` and return the operations, in
/// ascending role id order, that bring the reference to the live state.
///
/// Per role: label, admin, guardian, grants, revokes, then targets.
/// Comparing a snapshot with itself yields no operations.
pub fn compare(live: &ManagerSnapshot, reference: &ManagerSnapshot) -> Vec<Operation> {
    let mut operations = Vec::new();

    for (role_id, live_role) in &live.roles {
        let fallback;
        let reference_role = match reference.get(*role_id) {
            Some(role) => role,
            None => {
                fallback = default_reference(live_role);
                &fallback
            }
        };

        let before = operations.len();
        compare_role(live_role, reference_role, &mut operations);
        debug!(
            role_id,
            operations = operations.len() - before,
            "compared role"
        );
    }

    operations
}

/// What an unconfigured role looks like on-chain: no label, gated by the
/// admin role, no members, no targets. Built-in labels cannot be cleared,
/// so they are taken from the live role.
fn default_reference(live_role: &ManagedRole) -> ManagedRole {
    if is_builtin_role(live_role.id) {
        ManagedRole::labelled(live_role.id, &live_role.label)
    } else {
        ManagedRole::blank(live_role.id)
    }
}

fn compare_role(live: &ManagedRole, reference: &ManagedRole, out: &mut Vec<Operation>) {
    let role_id = live.id;

    if live.label != reference.label {
        out.push(Operation::LabelRole {
            role_id,
            label: live.label.clone(),
        });
    }
    if live.admin != reference.admin {
        out.push(Operation::SetRoleAdmin {
            role_id,
            admin: live.admin,
        });
    }
    if live.guardian != reference.guardian {
        out.push(Operation::SetRoleGuardian {
            role_id,
            guardian: live.guardian,
        });
    }

    for account in live.members.difference(&reference.members) {
        out.push(Operation::GrantRole {
            role_id,
            account: *account,
            execution_delay: 0,
        });
    }
    for account in reference.members.difference(&live.members) {
        out.push(Operation::RevokeRole {
            role_id,
            account: *account,
        });
    }

    for (target, selectors) in &live.targets {
        let Some(reference_selectors) = reference.targets.get(target) else {
            // Every function of an unknown target is restricted to ADMIN_ROLE.
            out.push(Operation::SetTargetFunctionRole {
                target: *target,
                selectors: selectors.clone(),
                role_id: ADMIN_ROLE_ID,
            });
            continue;
        };

        // Extra selectors are handed to ADMIN_ROLE, which need not be
        // their owner once removed from this role. Kept as is.
        let extra: BTreeSet<_> = selectors.difference(reference_selectors).copied().collect();
        let missing: BTreeSet<_> = reference_selectors.difference(selectors).copied().collect();
        if !extra.is_empty() {
            out.push(Operation::SetTargetFunctionRole {
                target: *target,
                selectors: extra,
                role_id: ADMIN_ROLE_ID,
            });
        }
        if !missing.is_empty() {
            out.push(Operation::SetTargetFunctionRole {
                target: *target,
                selectors: missing,
                role_id,
            });
        }
    }
}

#[derive(Debug, Error)]
pub enum DeterminismError {
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error("DETERMINISM FAILURE: two reductions produced different fingerprints ({first} vs {second})")]
    Mismatch { first: String, second: String },
}

/// Reduce the same events twice and require identical fingerprints.
/// Returns the fingerprint.
pub fn verify_determinism(events: &[Ordered<ManagerEvent>]) -> Result<String, DeterminismError> {
    let (_, first) = replay::rebuild_access_manager(events)?;
    let (_, second) = replay::rebuild_access_manager(events)?;

    if first != second {
        return Err(DeterminismError::Mismatch { first, second });
    }
    Ok(first)
}

/// `verify_determinism` for an AccessControl stream, ordered by role.
pub fn verify_membership_determinism(
    events: &[Ordered<ControlEvent>],
    registry: &Registry,
) -> Result<String, DeterminismError> {
    let (_, first) = replay::rebuild_access_control(events, registry)?;
    let (_, second) = replay::rebuild_access_control(events, registry)?;

    if first != second {
        return Err(DeterminismError::Mismatch { first, second });
    }
    Ok(first)
}
