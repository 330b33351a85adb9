/// Event Definitions
///
/// Events are pure data decoded from contract logs. They carry payload and
/// their position in the chain, nothing else. Each permission model has its
/// own closed set of kinds; anything outside it never becomes an event.

use std::collections::BTreeSet;
use std::fmt;

use alloy_primitives::{Address, B256};

use crate::domain::Selector;
use crate::error::ReduceError;

/// Position of a log in the chain: `(block_number, log_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub block_number: u64,
    pub log_index: u64,
}

impl OrderKey {
    pub fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.block_number, self.log_index)
    }
}

/// An event together with its order key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordered<E> {
    pub order: OrderKey,
    pub event: E,
}

impl<E> Ordered<E> {
    pub fn new(order: OrderKey, event: E) -> Self {
        Self { order, event }
    }
}

// ── AccessControl ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    RoleGranted {
        role: B256,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: B256,
        account: Address,
        sender: Address,
    },
    RoleAdminChanged {
        role: B256,
        previous_admin: B256,
        new_admin: B256,
    },
}

impl ControlEvent {
    pub const KINDS: [&'static str; 3] = ["RoleGranted", "RoleRevoked", "RoleAdminChanged"];

    pub fn kind(&self) -> &'static str {
        match self {
            ControlEvent::RoleGranted { .. } => "RoleGranted",
            ControlEvent::RoleRevoked { .. } => "RoleRevoked",
            ControlEvent::RoleAdminChanged { .. } => "RoleAdminChanged",
        }
    }

    pub fn role(&self) -> B256 {
        match self {
            ControlEvent::RoleGranted { role, .. }
            | ControlEvent::RoleRevoked { role, .. }
            | ControlEvent::RoleAdminChanged { role, .. } => *role,
        }
    }
}

// ── AccessManager ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    RoleGranted { role_id: u64, account: Address },
    RoleRevoked { role_id: u64, account: Address },
    RoleGuardianChanged { role_id: u64, guardian: u64 },
    RoleAdminChanged { role_id: u64, admin: u64 },
    RoleLabel { role_id: u64, label: String },
    TargetFunctionRoleUpdated {
        target: Address,
        selector: Selector,
        role_id: u64,
    },
}

impl ManagerEvent {
    pub const KINDS: [&'static str; 6] = [
        "RoleGranted",
        "RoleRevoked",
        "RoleGuardianChanged",
        "RoleAdminChanged",
        "RoleLabel",
        "TargetFunctionRoleUpdated",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            ManagerEvent::RoleGranted { .. } => "RoleGranted",
            ManagerEvent::RoleRevoked { .. } => "RoleRevoked",
            ManagerEvent::RoleGuardianChanged { .. } => "RoleGuardianChanged",
            ManagerEvent::RoleAdminChanged { .. } => "RoleAdminChanged",
            ManagerEvent::RoleLabel { .. } => "RoleLabel",
            ManagerEvent::TargetFunctionRoleUpdated { .. } => "TargetFunctionRoleUpdated",
        }
    }

    pub fn role_id(&self) -> u64 {
        match self {
            ManagerEvent::RoleGranted { role_id, .. }
            | ManagerEvent::RoleRevoked { role_id, .. }
            | ManagerEvent::RoleGuardianChanged { role_id, .. }
            | ManagerEvent::RoleAdminChanged { role_id, .. }
            | ManagerEvent::RoleLabel { role_id, .. }
            | ManagerEvent::TargetFunctionRoleUpdated { role_id, .. } => *role_id,
        }
    }
}

/// `RoleLabel | roleId=3 label=OPS`
impl fmt::Display for ManagerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | ", self.kind())?;
        match self {
            ManagerEvent::RoleGranted { role_id, account }
            | ManagerEvent::RoleRevoked { role_id, account } => {
                write!(f, "roleId={role_id} account={}", account.to_checksum(None))
            }
            ManagerEvent::RoleGuardianChanged { role_id, guardian } => {
                write!(f, "roleId={role_id} guardian={guardian}")
            }
            ManagerEvent::RoleAdminChanged { role_id, admin } => {
                write!(f, "roleId={role_id} admin={admin}")
            }
            ManagerEvent::RoleLabel { role_id, label } => {
                write!(f, "roleId={role_id} label={label}")
            }
            ManagerEvent::TargetFunctionRoleUpdated {
                target,
                selector,
                role_id,
            } => write!(
                f,
                "target={} selector={selector} roleId={role_id}",
                target.to_checksum(None)
            ),
        }
    }
}

// ── Ordering ───────────────────────────────────────────────────

fn reject_duplicate_keys<E>(events: &[Ordered<E>]) -> Result<(), ReduceError> {
    let mut seen = BTreeSet::new();
    for evt in events {
        if !seen.insert(evt.order) {
            return Err(ReduceError::DuplicateOrderKey(evt.order));
        }
    }
    Ok(())
}

/// Sort by role hash, then chronologically, so each role's events are
/// contiguous and in causal order.
pub fn order_by_role(
    mut events: Vec<Ordered<ControlEvent>>,
) -> Result<Vec<Ordered<ControlEvent>>, ReduceError> {
    reject_duplicate_keys(&events)?;
    events.sort_by(|a, b| {
        a.event
            .role()
            .cmp(&b.event.role())
            .then_with(|| a.order.cmp(&b.order))
    });
    Ok(events)
}

/// Sort strictly by order key.
pub fn order_chronologically<E>(mut events: Vec<Ordered<E>>) -> Result<Vec<Ordered<E>>, ReduceError> {
    reject_duplicate_keys(&events)?;
    events.sort_by_key(|evt| evt.order);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(role: u8, block: u64, index: u64) -> Ordered<ControlEvent> {
        Ordered::new(
            OrderKey::new(block, index),
            ControlEvent::RoleGranted {
                role: B256::with_last_byte(role),
                account: Address::with_last_byte(0xaa),
                sender: Address::ZERO,
            },
        )
    }

    #[test]
    fn order_by_role_groups_then_sorts_by_time() {
        let events = vec![granted(2, 1, 0), granted(1, 3, 0), granted(2, 0, 5), granted(1, 2, 1)];
        let ordered = order_by_role(events).unwrap();
        let keys: Vec<(u8, OrderKey)> = ordered
            .iter()
            .map(|e| (e.event.role()[31], e.order))
            .collect();
        assert_eq!(
            keys,
            vec![
                (1, OrderKey::new(2, 1)),
                (1, OrderKey::new(3, 0)),
                (2, OrderKey::new(0, 5)),
                (2, OrderKey::new(1, 0)),
            ]
        );
    }

    #[test]
    fn chronological_order_ignores_role() {
        let events = vec![granted(2, 1, 0), granted(1, 0, 3), granted(3, 0, 1)];
        let ordered = order_chronologically(events).unwrap();
        let keys: Vec<OrderKey> = ordered.iter().map(|e| e.order).collect();
        assert_eq!(
            keys,
            vec![OrderKey::new(0, 1), OrderKey::new(0, 3), OrderKey::new(1, 0)]
        );
    }

    #[test]
    fn duplicate_order_keys_are_rejected() {
        let events = vec![granted(1, 4, 2), granted(2, 4, 2)];
        assert_eq!(
            order_by_role(events.clone()).unwrap_err(),
            ReduceError::DuplicateOrderKey(OrderKey::new(4, 2))
        );
        assert!(order_chronologically(events).is_err());
    }

    #[test]
    fn manager_event_display_lists_args() {
        let evt = ManagerEvent::RoleLabel {
            role_id: 3,
            label: "OPS".to_string(),
        };
        assert_eq!(evt.to_string(), "RoleLabel | roleId=3 label=OPS");
    }
}
