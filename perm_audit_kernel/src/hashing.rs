/// Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 fingerprint of a
/// snapshot. Two reductions of the same events must produce the same
/// fingerprint.
///
/// Rules:
///   - Roles sorted by id (manager) or hash (membership)
///   - Members sorted by address bytes, written checksummed
///   - Targets sorted by address, selectors sorted
///   - UTF-8 JSON, no whitespace, fixed field order

use alloy_primitives::hex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{ManagerSnapshot, MembershipSnapshot};
use crate::SNAPSHOT_FORMAT_VERSION;

pub fn canonical_serialize_manager(snapshot: &ManagerSnapshot) -> Vec<u8> {
    let mut roles_list = Vec::with_capacity(snapshot.roles.len());
    for role in snapshot.roles.values() {
        let mut role_map = Map::new();
        role_map.insert("id".to_string(), Value::from(role.id));
        role_map.insert("label".to_string(), Value::from(role.label.clone()));
        role_map.insert("guardian".to_string(), Value::from(role.guardian));
        role_map.insert("admin".to_string(), Value::from(role.admin));
        role_map.insert(
            "members".to_string(),
            Value::Array(
                role.members
                    .iter()
                    .map(|m| Value::String(m.to_checksum(None)))
                    .collect(),
            ),
        );

        let mut targets_list = Vec::with_capacity(role.targets.len());
        for (target, selectors) in &role.targets {
            let mut target_map = Map::new();
            target_map.insert("target".to_string(), Value::String(target.to_checksum(None)));
            target_map.insert(
                "selectors".to_string(),
                Value::Array(selectors.iter().map(|s| Value::String(s.to_string())).collect()),
            );
            targets_list.push(Value::Object(target_map));
        }
        role_map.insert("targets".to_string(), Value::Array(targets_list));

        roles_list.push(Value::Object(role_map));
    }

    with_version(roles_list)
}

pub fn canonical_serialize_membership(snapshot: &MembershipSnapshot) -> Vec<u8> {
    let mut entries: Vec<_> = snapshot.iter().collect();
    entries.sort_by_key(|entry| entry.role.hash());

    let roles_list = entries
        .into_iter()
        .map(|entry| {
            let mut role_map = Map::new();
            role_map.insert("hash".to_string(), Value::String(entry.role.hash().to_string()));
            role_map.insert("admin".to_string(), Value::String(entry.admin.hash().to_string()));
            role_map.insert(
                "members".to_string(),
                Value::Array(
                    entry
                        .members
                        .iter()
                        .map(|m| Value::String(m.to_checksum(None)))
                        .collect(),
                ),
            );
            Value::Object(role_map)
        })
        .collect();

    with_version(roles_list)
}

fn with_version(roles_list: Vec<Value>) -> Vec<u8> {
    // format_version MUST be first.
    let mut root = Map::new();
    root.insert(
        "format_version".to_string(),
        Value::from(SNAPSHOT_FORMAT_VERSION),
    );
    root.insert("roles".to_string(), Value::Array(roles_list));
    Value::Object(root).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex.
pub fn manager_fingerprint(snapshot: &ManagerSnapshot) -> String {
    hex::encode(Sha256::digest(canonical_serialize_manager(snapshot)))
}

pub fn membership_fingerprint(snapshot: &MembershipSnapshot) -> String {
    hex::encode(Sha256::digest(canonical_serialize_membership(snapshot)))
}
