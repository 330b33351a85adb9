/// Core Domain Types
///
/// Pure data. Collections are ordered so that iteration, serialization
/// and diff output are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use alloy_primitives::{Address, FixedBytes};
use serde_json::{json, Value};

use crate::roles::RoleIdentity;

/// 4-byte function selector.
pub type Selector = FixedBytes<4>;

pub const ADMIN_ROLE_ID: u64 = 0;
/// Sentinel role every account implicitly holds.
pub const PUBLIC_ROLE_ID: u64 = u64::MAX;

pub const ADMIN_ROLE_LABEL: &str = "ADMIN_ROLE";
pub const PUBLIC_ROLE_LABEL: &str = "PUBLIC_ROLE";

pub fn is_builtin_role(role_id: u64) -> bool {
    role_id == ADMIN_ROLE_ID || role_id == PUBLIC_ROLE_ID
}

// ── AccessControl ──────────────────────────────────────────────

/// Current holders of one AccessControl role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEntry {
    pub role: RoleIdentity,
    /// Role allowed to grant and revoke `role`. Defaults to the zero role.
    pub admin: RoleIdentity,
    pub members: BTreeSet<Address>,
}

/// One entry per role hash seen in the stream, ordered by hash. Roles whose
/// members were all revoked stay in the list with an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    pub entries: Vec<MembershipEntry>,
}

impl MembershipSnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &MembershipEntry> {
        self.entries.iter()
    }

    pub fn get(&self, role: &RoleIdentity) -> Option<&MembershipEntry> {
        self.entries.iter().find(|entry| &entry.role == role)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── AccessManager ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRole {
    pub id: u64,
    pub label: String,
    pub guardian: u64,
    pub admin: u64,
    pub members: BTreeSet<Address>,
    pub targets: BTreeMap<Address, BTreeSet<Selector>>,
}

impl ManagedRole {
    /// Unconfigured role: no label, gated by `ADMIN_ROLE_ID`.
    pub fn blank(id: u64) -> Self {
        Self::labelled(id, "")
    }

    pub fn labelled(id: u64, label: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            guardian: ADMIN_ROLE_ID,
            admin: ADMIN_ROLE_ID,
            members: BTreeSet::new(),
            targets: BTreeMap::new(),
        }
    }
}

impl fmt::Display for ManagedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerSnapshot {
    pub roles: BTreeMap<u64, ManagedRole>,
}

impl ManagerSnapshot {
    pub fn get(&self, role_id: u64) -> Option<&ManagedRole> {
        self.roles.get(&role_id)
    }

    pub fn insert(&mut self, role: ManagedRole) {
        self.roles.insert(role.id, role);
    }
}

// ── Reconciliation operations ──────────────────────────────────

/// One AccessManager call. Field names follow the contract ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GrantRole {
        role_id: u64,
        account: Address,
        execution_delay: u32,
    },
    RevokeRole {
        role_id: u64,
        account: Address,
    },
    SetRoleGuardian {
        role_id: u64,
        guardian: u64,
    },
    SetRoleAdmin {
        role_id: u64,
        admin: u64,
    },
    LabelRole {
        role_id: u64,
        label: String,
    },
    SetTargetFunctionRole {
        target: Address,
        selectors: BTreeSet<Selector>,
        role_id: u64,
    },
    SetGrantDelay {
        role_id: u64,
        new_delay: u32,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::GrantRole { .. } => "grantRole",
            Operation::RevokeRole { .. } => "revokeRole",
            Operation::SetRoleGuardian { .. } => "setRoleGuardian",
            Operation::SetRoleAdmin { .. } => "setRoleAdmin",
            Operation::LabelRole { .. } => "labelRole",
            Operation::SetTargetFunctionRole { .. } => "setTargetFunctionRole",
            Operation::SetGrantDelay { .. } => "setGrantDelay",
        }
    }

    /// `{"op": ..., "args": {...}}`
    pub fn to_value(&self) -> Value {
        let args = match self {
            Operation::GrantRole {
                role_id,
                account,
                execution_delay,
            } => json!({
                "roleId": role_id,
                "account": account.to_checksum(None),
                "executionDelay": execution_delay,
            }),
            Operation::RevokeRole { role_id, account } => json!({
                "roleId": role_id,
                "account": account.to_checksum(None),
            }),
            Operation::SetRoleGuardian { role_id, guardian } => json!({
                "roleId": role_id,
                "guardian": guardian,
            }),
            Operation::SetRoleAdmin { role_id, admin } => json!({
                "roleId": role_id,
                "admin": admin,
            }),
            Operation::LabelRole { role_id, label } => json!({
                "roleId": role_id,
                "label": label,
            }),
            Operation::SetTargetFunctionRole {
                target,
                selectors,
                role_id,
            } => json!({
                "target": target.to_checksum(None),
                "selectors": selectors.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                "roleId": role_id,
            }),
            Operation::SetGrantDelay { role_id, new_delay } => json!({
                "roleId": role_id,
                "newDelay": new_delay,
            }),
        };
        json!({ "op": self.kind(), "args": args })
    }
}
