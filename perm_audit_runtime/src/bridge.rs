//! Raw ↔ Kernel conversion bridge.
//!
//! Turns name-keyed raw records into the kernel's typed events. This is the
//! only place an event kind or argument is checked by name: anything the
//! model does not know, or an argument that is missing or ill-typed, is a
//! `MalformedEvent` and aborts the load.

use std::str::FromStr;

use alloy_primitives::{Address, B256};
use serde_json::Value;

use perm_audit_kernel::domain::Selector;
use perm_audit_kernel::error::ReduceError;
use perm_audit_kernel::events::{ControlEvent, ManagerEvent, Ordered};

use crate::raw::RawEvent;

/// Convert an AccessControl raw event.
pub fn decode_control(raw: &RawEvent) -> Result<Ordered<ControlEvent>, ReduceError> {
    let event = match raw.event.as_str() {
        // RoleGranted(bytes32 indexed role, address indexed account, address indexed sender)
        "RoleGranted" => ControlEvent::RoleGranted {
            role: arg_hash(raw, "role")?,
            account: arg_address(raw, "account")?,
            sender: arg_address(raw, "sender")?,
        },
        // RoleRevoked(bytes32 indexed role, address indexed account, address indexed sender)
        "RoleRevoked" => ControlEvent::RoleRevoked {
            role: arg_hash(raw, "role")?,
            account: arg_address(raw, "account")?,
            sender: arg_address(raw, "sender")?,
        },
        // RoleAdminChanged(bytes32 indexed role, bytes32 indexed previousAdminRole, bytes32 indexed newAdminRole)
        "RoleAdminChanged" => ControlEvent::RoleAdminChanged {
            role: arg_hash(raw, "role")?,
            previous_admin: arg_hash(raw, "previousAdminRole")?,
            new_admin: arg_hash(raw, "newAdminRole")?,
        },
        other => {
            return Err(ReduceError::malformed(other, "not an AccessControl event"));
        }
    };
    Ok(Ordered::new(raw.order(), event))
}

/// Convert an AccessManager raw event.
pub fn decode_manager(raw: &RawEvent) -> Result<Ordered<ManagerEvent>, ReduceError> {
    let event = match raw.event.as_str() {
        // RoleGranted(uint64 indexed roleId, address indexed account, uint32 delay, uint48 since, bool newMember)
        // delay and since are not modelled.
        "RoleGranted" => ManagerEvent::RoleGranted {
            role_id: arg_u64(raw, "roleId")?,
            account: arg_address(raw, "account")?,
        },
        // RoleRevoked(uint64 indexed roleId, address indexed account)
        "RoleRevoked" => ManagerEvent::RoleRevoked {
            role_id: arg_u64(raw, "roleId")?,
            account: arg_address(raw, "account")?,
        },
        // RoleGuardianChanged(uint64 indexed roleId, uint64 indexed guardian)
        "RoleGuardianChanged" => ManagerEvent::RoleGuardianChanged {
            role_id: arg_u64(raw, "roleId")?,
            guardian: arg_u64(raw, "guardian")?,
        },
        // RoleAdminChanged(uint64 indexed roleId, uint64 indexed admin)
        "RoleAdminChanged" => ManagerEvent::RoleAdminChanged {
            role_id: arg_u64(raw, "roleId")?,
            admin: arg_u64(raw, "admin")?,
        },
        // RoleLabel(uint64 indexed roleId, string label)
        "RoleLabel" => ManagerEvent::RoleLabel {
            role_id: arg_u64(raw, "roleId")?,
            label: arg_str(raw, "label")?.to_string(),
        },
        // TargetFunctionRoleUpdated(address indexed target, bytes4 selector, uint64 indexed roleId)
        "TargetFunctionRoleUpdated" => ManagerEvent::TargetFunctionRoleUpdated {
            target: arg_address(raw, "target")?,
            selector: arg_selector(raw, "selector")?,
            role_id: arg_u64(raw, "roleId")?,
        },
        other => {
            return Err(ReduceError::malformed(other, "not an AccessManager event"));
        }
    };
    Ok(Ordered::new(raw.order(), event))
}

// ---------------------------------------------------------------------------
// Argument accessors
// ---------------------------------------------------------------------------

fn arg<'a>(raw: &'a RawEvent, name: &str) -> Result<&'a Value, ReduceError> {
    raw.args
        .get(name)
        .ok_or_else(|| ReduceError::malformed(&raw.event, format!("missing argument {name:?}")))
}

fn arg_str<'a>(raw: &'a RawEvent, name: &str) -> Result<&'a str, ReduceError> {
    arg(raw, name)?.as_str().ok_or_else(|| {
        ReduceError::malformed(&raw.event, format!("argument {name:?} is not a string"))
    })
}

fn arg_u64(raw: &RawEvent, name: &str) -> Result<u64, ReduceError> {
    let value = arg(raw, name)?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| {
            ReduceError::malformed(&raw.event, format!("argument {name:?} is not a uint64: {value}"))
        })
}

fn parse_arg<T>(raw: &RawEvent, name: &str) -> Result<T, ReduceError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let text = arg_str(raw, name)?;
    T::from_str(text).map_err(|e| {
        ReduceError::malformed(&raw.event, format!("argument {name:?} = {text:?}: {e}"))
    })
}

fn arg_address(raw: &RawEvent, name: &str) -> Result<Address, ReduceError> {
    parse_arg(raw, name)
}

fn arg_hash(raw: &RawEvent, name: &str) -> Result<B256, ReduceError> {
    parse_arg(raw, name)
}

fn arg_selector(raw: &RawEvent, name: &str) -> Result<Selector, ReduceError> {
    parse_arg(raw, name)
}
