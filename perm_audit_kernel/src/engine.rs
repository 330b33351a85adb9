/// Engine
///
/// Top-level reducers. Each takes a stream already in its model's order,
/// verifies that order, and folds it through `transitions`.

use std::collections::BTreeSet;

use alloy_primitives::B256;
use tracing::debug;

use crate::domain::{ManagerSnapshot, MembershipEntry, MembershipSnapshot};
use crate::error::ReduceError;
use crate::events::{ControlEvent, ManagerEvent, Ordered};
use crate::roles::Registry;
use crate::state::initial_manager_snapshot;
use crate::transitions::{apply_control_event, apply_manager_event};

/// Reduce a role-ordered AccessControl stream (see `order_by_role`) into the
/// current member set of every role.
pub fn reduce_access_control(
    events: &[Ordered<ControlEvent>],
    registry: &Registry,
) -> Result<MembershipSnapshot, ReduceError> {
    for pair in events.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let prev_key = (prev.event.role(), prev.order);
        let next_key = (next.event.role(), next.order);
        if prev_key >= next_key {
            return Err(ReduceError::OutOfOrder {
                previous: prev.order,
                found: next.order,
            });
        }
    }

    let mut entries = Vec::new();
    for group in events.chunk_by(|a, b| a.event.role() == b.event.role()) {
        let role = registry.resolve(group[0].event.role());
        let mut members = BTreeSet::new();
        let mut admin = B256::ZERO;
        for evt in group {
            apply_control_event(&mut members, &mut admin, &role, &evt.event)?;
        }
        debug!(%role, members = members.len(), "reduced role");
        entries.push(MembershipEntry {
            role,
            admin: registry.resolve(admin),
            members,
        });
    }

    Ok(MembershipSnapshot { entries })
}

/// Reduce a chronologically ordered AccessManager stream into role records,
/// starting from the built-in roles.
pub fn reduce_access_manager(
    events: &[Ordered<ManagerEvent>],
) -> Result<ManagerSnapshot, ReduceError> {
    for pair in events.windows(2) {
        if pair[0].order >= pair[1].order {
            return Err(ReduceError::OutOfOrder {
                previous: pair[0].order,
                found: pair[1].order,
            });
        }
    }

    let mut snapshot = initial_manager_snapshot();
    for evt in events {
        apply_manager_event(&mut snapshot, &evt.event)?;
    }
    debug!(roles = snapshot.roles.len(), events = events.len(), "reduced access manager");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::*;
    use crate::domain::{ADMIN_ROLE_ID, PUBLIC_ROLE_ID};
    use crate::events::{order_by_role, OrderKey};
    use crate::roles::RoleIdentity;

    fn control(role: &RoleIdentity, granted: bool, account: u8, block: u64, index: u64) -> Ordered<ControlEvent> {
        let account = Address::with_last_byte(account);
        let event = if granted {
            ControlEvent::RoleGranted {
                role: role.hash(),
                account,
                sender: Address::ZERO,
            }
        } else {
            ControlEvent::RoleRevoked {
                role: role.hash(),
                account,
                sender: Address::ZERO,
            }
        };
        Ordered::new(OrderKey::new(block, index), event)
    }

    #[test]
    fn grant_grant_revoke_leaves_second_member() {
        let mut registry = Registry::new();
        registry.add_roles(["R"]).unwrap();
        let role = RoleIdentity::new("R", None).unwrap();

        let events = order_by_role(vec![
            control(&role, true, 0xaa, 1, 0),
            control(&role, true, 0xbb, 1, 1),
            control(&role, false, 0xaa, 2, 0),
        ])
        .unwrap();
        let snapshot = reduce_access_control(&events, &registry).unwrap();

        assert_eq!(snapshot.len(), 1);
        let entry = snapshot.get(&role).unwrap();
        assert_eq!(entry.role.name(), "R");
        assert_eq!(entry.members, [Address::with_last_byte(0xbb)].into_iter().collect());
        assert_eq!(entry.admin, RoleIdentity::default_admin());
    }

    #[test]
    fn fully_revoked_role_is_kept_empty() {
        let registry = Registry::new();
        let role = RoleIdentity::new("R", None).unwrap();
        let events = order_by_role(vec![
            control(&role, true, 0xaa, 1, 0),
            control(&role, false, 0xaa, 2, 0),
        ])
        .unwrap();
        let snapshot = reduce_access_control(&events, &registry).unwrap();
        let entry = snapshot.get(&role).unwrap();
        assert!(entry.members.is_empty());
        assert!(entry.role.is_unresolved());
    }

    #[test]
    fn unsorted_control_stream_is_rejected() {
        let registry = Registry::new();
        let role = RoleIdentity::new("R", None).unwrap();
        let events = vec![control(&role, true, 0xaa, 2, 0), control(&role, true, 0xbb, 1, 0)];
        assert!(matches!(
            reduce_access_control(&events, &registry),
            Err(ReduceError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn empty_manager_stream_yields_builtins() {
        let snapshot = reduce_access_manager(&[]).unwrap();
        assert_eq!(snapshot.roles.len(), 2);
        assert_eq!(snapshot.get(ADMIN_ROLE_ID).unwrap().label, "ADMIN_ROLE");
        assert_eq!(snapshot.get(PUBLIC_ROLE_ID).unwrap().label, "PUBLIC_ROLE");
    }

    #[test]
    fn manager_revoke_before_grant_fails() {
        let account = Address::with_last_byte(1);
        let events = vec![
            Ordered::new(
                OrderKey::new(1, 0),
                ManagerEvent::RoleRevoked { role_id: 3, account },
            ),
            Ordered::new(
                OrderKey::new(2, 0),
                ManagerEvent::RoleGranted { role_id: 3, account },
            ),
        ];
        assert!(matches!(
            reduce_access_manager(&events),
            Err(ReduceError::InconsistentState { .. })
        ));
    }
}
