/// Role identity and resolver registry.
///
/// A role is identified by the keccak256 of its name. A role scoped to a
/// component XORs the component address onto the leading 20 bytes of that
/// hash. Equality is hash-only.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use alloy_primitives::{keccak256, Address, B256};
use thiserror::Error;
use tracing::debug;

/// Display name given to the all-zero role.
pub const DEFAULT_ADMIN_NAME: &str = "DEFAULT_ADMIN_ROLE";

/// Prefix flagging a role whose hash is not in the registry.
pub const UNRESOLVED_PREFIX: &str = "UNKNOWN ROLE: ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("role name must not be empty")]
    EmptyName,

    #[error("invalid role hash {0:?}: {1}")]
    InvalidHash(String, String),
}

/// Shorten a `0x` hex string to `0x1234...abcd`.
pub fn ellipsize(hex: &str) -> String {
    let body = hex.strip_prefix("0x").unwrap_or(hex);
    if body.len() <= 10 {
        return format!("0x{body}");
    }
    format!("0x{}...{}", &body[..4], &body[body.len() - 4..])
}

// ── Component ──────────────────────────────────────────────────

/// A contract instance that can own scoped roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub address: Address,
    pub name: Option<String>,
}

impl Component {
    pub fn new(address: Address, name: Option<String>) -> Self {
        Self { address, name }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "Component<{}>", ellipsize(&self.address.to_checksum(None))),
        }
    }
}

// ── RoleIdentity ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RoleIdentity {
    hash: B256,
    name: String,
    component: Option<Component>,
}

impl RoleIdentity {
    /// Role named `name`, optionally scoped to `component`.
    pub fn new(name: &str, component: Option<Component>) -> Result<Self, RoleError> {
        if name.is_empty() {
            return Err(RoleError::EmptyName);
        }
        let hash = scoped_hash(keccak256(name.as_bytes()), component.as_ref());
        Ok(Self {
            hash,
            name: name.to_string(),
            component,
        })
    }

    /// Placeholder for a hash with no known name. The hash is taken as-is.
    pub fn from_hash(hash: B256, component: Option<Component>) -> Self {
        Self {
            hash,
            name: format!("{UNRESOLVED_PREFIX}{}", ellipsize(&hash.to_string())),
            component,
        }
    }

    pub fn default_admin() -> Self {
        Self {
            hash: B256::ZERO,
            name: DEFAULT_ADMIN_NAME.to_string(),
            component: None,
        }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> Option<&Component> {
        self.component.as_ref()
    }

    pub fn is_unresolved(&self) -> bool {
        self.name.starts_with(UNRESOLVED_PREFIX)
    }
}

fn scoped_hash(base: B256, component: Option<&Component>) -> B256 {
    let Some(component) = component else {
        return base;
    };
    let mut out = base.0;
    for (byte, addr_byte) in out.iter_mut().zip(component.address.as_slice()) {
        *byte ^= addr_byte;
    }
    B256::from(out)
}

impl PartialEq for RoleIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for RoleIdentity {}

impl Hash for RoleIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for RoleIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoleIdentity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl fmt::Display for RoleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role:{}", self.name)?;
        if let Some(component) = &self.component {
            write!(f, "@{component}")?;
        }
        Ok(())
    }
}

// ── Registry ───────────────────────────────────────────────────

/// Hash → role table used to give names to the hashes found in events.
///
/// Populate during setup, then share by reference. Resolution never fails.
#[derive(Debug, Clone)]
pub struct Registry {
    roles: BTreeMap<B256, RoleIdentity>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Self {
            roles: BTreeMap::new(),
        };
        registry.add(RoleIdentity::default_admin());
        registry
    }

    pub fn add(&mut self, role: RoleIdentity) {
        self.roles.insert(role.hash, role);
    }

    /// Insert an unscoped role for each name.
    pub fn add_roles<I, S>(&mut self, names: I) -> Result<(), RoleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add(RoleIdentity::new(name.as_ref(), None)?);
        }
        Ok(())
    }

    /// Scope every unscoped role currently known to each of `components`.
    ///
    /// Works off a copy of the table taken before the first insertion.
    pub fn add_components<I>(&mut self, components: I)
    where
        I: IntoIterator<Item = Component>,
    {
        let unscoped: Vec<String> = self
            .roles
            .values()
            .filter(|role| role.component.is_none())
            .map(|role| role.name.clone())
            .collect();

        for component in components {
            for name in &unscoped {
                let hash = scoped_hash(keccak256(name.as_bytes()), Some(&component));
                debug!(role = %name, component = %component, %hash, "registered scoped role");
                self.add(RoleIdentity {
                    hash,
                    name: name.clone(),
                    component: Some(component.clone()),
                });
            }
        }
    }

    /// Look up `hash`, falling back to an unresolved placeholder.
    pub fn resolve(&self, hash: B256) -> RoleIdentity {
        match self.roles.get(&hash) {
            Some(role) => role.clone(),
            None => {
                debug!(%hash, "role hash not in registry");
                RoleIdentity::from_hash(hash, None)
            }
        }
    }

    /// `resolve` for a `0x`-prefixed (or bare) hex hash.
    pub fn resolve_str(&self, hash: &str) -> Result<RoleIdentity, RoleError> {
        let hash = B256::from_str(hash)
            .map_err(|e| RoleError::InvalidHash(hash.to_string(), e.to_string()))?;
        Ok(self.resolve(hash))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleIdentity> {
        self.roles.values()
    }
}
