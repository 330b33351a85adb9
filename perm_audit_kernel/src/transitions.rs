/// Centralized Transition Logic
///
/// ALL state-mutation logic lives here. One function per permission model,
/// each an exhaustive match over that model's closed event set.

use std::collections::BTreeSet;

use alloy_primitives::{Address, B256};
use tracing::warn;

use crate::domain::{ManagedRole, ManagerSnapshot};
use crate::error::ReduceError;
use crate::events::{ControlEvent, ManagerEvent};
use crate::roles::RoleIdentity;

/// Fold one AccessControl event into the running state of its role.
///
/// `role` names the role in errors; `admin` holds the latest admin hash.
pub fn apply_control_event(
    members: &mut BTreeSet<Address>,
    admin: &mut B256,
    role: &RoleIdentity,
    event: &ControlEvent,
) -> Result<(), ReduceError> {
    match event {
        ControlEvent::RoleGranted { account, .. } => {
            members.insert(*account);
        }
        ControlEvent::RoleRevoked { account, .. } => {
            if !members.remove(account) {
                warn!(%role, %account, "revoke for account that does not hold the role");
                return Err(ReduceError::InconsistentState {
                    role: role.to_string(),
                    account: *account,
                });
            }
        }
        ControlEvent::RoleAdminChanged { new_admin, .. } => {
            *admin = *new_admin;
        }
    }
    Ok(())
}

/// Fold one AccessManager event into `snapshot`, creating the role if this
/// is the first time its id appears.
pub fn apply_manager_event(
    snapshot: &mut ManagerSnapshot,
    event: &ManagerEvent,
) -> Result<(), ReduceError> {
    let role_id = event.role_id();
    let role = snapshot
        .roles
        .entry(role_id)
        .or_insert_with(|| ManagedRole::blank(role_id));

    match event {
        ManagerEvent::RoleGranted { account, .. } => {
            role.members.insert(*account);
        }
        ManagerEvent::RoleRevoked { account, .. } => {
            if !role.members.remove(account) {
                warn!(role_id, %account, "revoke for account that does not hold the role");
                return Err(ReduceError::InconsistentState {
                    role: role.to_string(),
                    account: *account,
                });
            }
        }
        ManagerEvent::RoleGuardianChanged { guardian, .. } => {
            role.guardian = *guardian;
        }
        ManagerEvent::RoleAdminChanged { admin, .. } => {
            role.admin = *admin;
        }
        ManagerEvent::RoleLabel { label, .. } => {
            role.label = label.clone();
        }
        ManagerEvent::TargetFunctionRoleUpdated {
            target, selector, ..
        } => {
            role.targets.entry(*target).or_default().insert(*selector);
        }
    }
    Ok(())
}
