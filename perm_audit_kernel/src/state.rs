/// State Construction

use crate::domain::{
    ManagedRole, ManagerSnapshot, ADMIN_ROLE_ID, ADMIN_ROLE_LABEL, PUBLIC_ROLE_ID,
    PUBLIC_ROLE_LABEL,
};

/// The two roles every AccessManager has before any event is emitted.
pub fn builtin_roles() -> [ManagedRole; 2] {
    [
        ManagedRole::labelled(ADMIN_ROLE_ID, ADMIN_ROLE_LABEL),
        ManagedRole::labelled(PUBLIC_ROLE_ID, PUBLIC_ROLE_LABEL),
    ]
}

/// Fresh AccessManager snapshot seeded with the built-in roles.
pub fn initial_manager_snapshot() -> ManagerSnapshot {
    let mut snapshot = ManagerSnapshot::default();
    for role in builtin_roles() {
        snapshot.insert(role);
    }
    snapshot
}
