//! Snapshot Codec — the stored reference snapshot format and the JSON
//! renderings of snapshots and operations.
//!
//! - `encode_reference` / `decode_reference`: ManagerSnapshot ↔ JSON
//!   `{ "<roleId>": {label, id, guardian, admin, members, targets} }`
//! - `export_reference_to_file` / `import_reference_from_file`: file I/O
//! - `encode_operations`: `[{op, args}]`
//! - `encode_membership`: AccessControl snapshot for printing
//!
//! Addresses are written EIP-55 checksummed and read in any case.
//! Selectors are `0x` + 8 hex digits.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use perm_audit_kernel::domain::{
    ManagedRole, ManagerSnapshot, MembershipSnapshot, Operation, Selector,
};
use perm_audit_kernel::invariants::{validate_snapshot, InvariantError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot key {0:?} is not a role id")]
    InvalidRoleKey(String),

    #[error("role {0} appears under more than one key")]
    DuplicateRoleId(u64),

    #[error("invalid address {value:?} in role {role_id}: {reason}")]
    InvalidAddress {
        role_id: u64,
        value: String,
        reason: String,
    },

    #[error("invalid selector {value:?} in role {role_id}: {reason}")]
    InvalidSelector {
        role_id: u64,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error("snapshot file I/O failed: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Wire record
// ---------------------------------------------------------------------------

/// One role as stored in a reference snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleRecord {
    pub label: String,
    pub id: u64,
    pub guardian: u64,
    pub admin: u64,
    pub members: Vec<String>,
    pub targets: BTreeMap<String, Vec<String>>,
}

impl From<&ManagedRole> for RoleRecord {
    fn from(role: &ManagedRole) -> Self {
        Self {
            label: role.label.clone(),
            id: role.id,
            guardian: role.guardian,
            admin: role.admin,
            members: role.members.iter().map(|m| m.to_checksum(None)).collect(),
            targets: role
                .targets
                .iter()
                .map(|(target, selectors)| {
                    (
                        target.to_checksum(None),
                        selectors.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl TryFrom<RoleRecord> for ManagedRole {
    type Error = SnapshotError;

    fn try_from(record: RoleRecord) -> Result<Self, SnapshotError> {
        let role_id = record.id;
        let parse_address = |value: &str| {
            Address::from_str(value).map_err(|e| SnapshotError::InvalidAddress {
                role_id,
                value: value.to_string(),
                reason: e.to_string(),
            })
        };

        let members = record
            .members
            .iter()
            .map(|m| parse_address(m.as_str()))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut targets = BTreeMap::new();
        for (target, selectors) in &record.targets {
            let selectors = selectors
                .iter()
                .map(|s| {
                    Selector::from_str(s).map_err(|e| SnapshotError::InvalidSelector {
                        role_id,
                        value: s.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            targets.insert(parse_address(target.as_str())?, selectors);
        }

        Ok(ManagedRole {
            id: record.id,
            label: record.label,
            guardian: record.guardian,
            admin: record.admin,
            members,
            targets,
        })
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a snapshot in the reference format. Roles appear in ascending id
/// order; output is byte-identical for identical snapshots.
pub fn encode_reference(snapshot: &ManagerSnapshot) -> Result<String, SnapshotError> {
    let mut root = Map::new();
    for (role_id, role) in &snapshot.roles {
        root.insert(role_id.to_string(), serde_json::to_value(RoleRecord::from(role))?);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

/// `[{op, args}, ...]`, pretty-printed.
pub fn encode_operations(operations: &[Operation]) -> Result<String, SnapshotError> {
    let list: Vec<Value> = operations.iter().map(Operation::to_value).collect();
    Ok(serde_json::to_string_pretty(&list)?)
}

/// AccessControl snapshot as a list of `{role, hash, admin, members}`.
pub fn encode_membership(snapshot: &MembershipSnapshot) -> Value {
    Value::Array(
        snapshot
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "role": entry.role.to_string(),
                    "hash": entry.role.hash().to_string(),
                    "admin": entry.admin.to_string(),
                    "members": entry
                        .members
                        .iter()
                        .map(|m| m.to_checksum(None))
                        .collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode and validate a reference snapshot.
///
/// Strict: unknown fields, non-numeric keys, two keys naming the same
/// role id, a key that differs from its record's id, and bad addresses or
/// selectors are all errors. Any role may be absent, built-ins included.
pub fn decode_reference(json: &str) -> Result<ManagerSnapshot, SnapshotError> {
    let records: BTreeMap<String, RoleRecord> = serde_json::from_str(json)?;

    let mut snapshot = ManagerSnapshot::default();
    for (key, record) in records {
        let role_id = key
            .trim()
            .parse::<u64>()
            .map_err(|_| SnapshotError::InvalidRoleKey(key.clone()))?;
        if snapshot
            .roles
            .insert(role_id, ManagedRole::try_from(record)?)
            .is_some()
        {
            return Err(SnapshotError::DuplicateRoleId(role_id));
        }
    }

    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Write a reference snapshot, creating parent directories if needed.
pub fn export_reference_to_file(
    snapshot: &ManagerSnapshot,
    path: &Path,
) -> Result<(), SnapshotError> {
    let json = encode_reference(snapshot)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn import_reference_from_file(path: &Path) -> Result<ManagerSnapshot, SnapshotError> {
    let content = fs::read_to_string(path)?;
    decode_reference(&content)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
