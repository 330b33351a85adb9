//! Audit configuration — known roles and components used to seed the
//! role registry before any event is resolved.
//!
//! Read from the environment:
//!   KNOWN_ROLES            comma list, default GUARDIAN_ROLE,LEVEL1_ROLE,LEVEL2_ROLE,LEVEL3_ROLE
//!   KNOWN_COMPONENTS       comma list of component addresses
//!   KNOWN_COMPONENT_NAMES  comma list, paired with KNOWN_COMPONENTS by position
//!
//! or from a JSON document with the same content.

use std::str::FromStr;

use alloy_primitives::Address;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use perm_audit_kernel::roles::{Component, Registry, RoleError};

pub const DEFAULT_KNOWN_ROLES: [&str; 4] =
    ["GUARDIAN_ROLE", "LEVEL1_ROLE", "LEVEL2_ROLE", "LEVEL3_ROLE"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid component address {value:?}: {reason}")]
    InvalidComponentAddress { value: String, reason: String },

    #[error("component name {0:?} has no matching address in KNOWN_COMPONENTS")]
    UnpairedComponentName(String),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error("bad config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub known_roles: Vec<String>,
    pub known_components: Vec<ComponentConfig>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            known_roles: DEFAULT_KNOWN_ROLES.iter().map(|r| r.to_string()).collect(),
            known_components: Vec::new(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl AuditConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup with the environment's variable
    /// names. An unset `KNOWN_ROLES` keeps the defaults; a set but empty
    /// one means no extra roles.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let known_roles = match lookup("KNOWN_ROLES") {
            Some(value) => split_list(&value),
            None => Self::default().known_roles,
        };
        let addresses = lookup("KNOWN_COMPONENTS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        let names = lookup("KNOWN_COMPONENT_NAMES")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        if let Some(extra) = names.get(addresses.len()) {
            return Err(ConfigError::UnpairedComponentName(extra.clone()));
        }

        let mut names = names.into_iter();
        let known_components = addresses
            .into_iter()
            .map(|address| ComponentConfig {
                address,
                name: names.next(),
            })
            .collect();

        Ok(Self {
            known_roles,
            known_components,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn components(&self) -> Result<Vec<Component>, ConfigError> {
        self.known_components
            .iter()
            .map(|c| {
                let address = Address::from_str(&c.address).map_err(|e| {
                    ConfigError::InvalidComponentAddress {
                        value: c.address.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Component::new(address, c.name.clone()))
            })
            .collect()
    }

    /// Registry holding the default admin, every known role, and every
    /// known role scoped to every known component.
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new();
        registry.add_roles(&self.known_roles)?;
        registry.add_components(self.components()?);
        debug!(
            roles = self.known_roles.len(),
            components = self.known_components.len(),
            entries = registry.len(),
            "built role registry"
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use perm_audit_kernel::roles::RoleIdentity;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn unset_environment_uses_default_roles() {
        let config = AuditConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AuditConfig::default());
        assert_eq!(config.known_roles.len(), 4);
    }

    #[test]
    fn component_names_pair_by_position() {
        let config = AuditConfig::from_lookup(lookup(&[
            ("KNOWN_ROLES", "OPS_ROLE"),
            (
                "KNOWN_COMPONENTS",
                "0x0000000000000000000000000000000000000001, 0x0000000000000000000000000000000000000002",
            ),
            ("KNOWN_COMPONENT_NAMES", "Vault"),
        ]))
        .unwrap();

        assert_eq!(config.known_roles, vec!["OPS_ROLE".to_string()]);
        assert_eq!(config.known_components[0].name.as_deref(), Some("Vault"));
        assert_eq!(config.known_components[1].name, None);
    }

    #[test]
    fn extra_component_name_is_an_error() {
        let err = AuditConfig::from_lookup(lookup(&[("KNOWN_COMPONENT_NAMES", "Orphan")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnpairedComponentName(name) if name == "Orphan"));
    }

    #[test]
    fn registry_resolves_scoped_roles() {
        let config = AuditConfig::from_json(
            r#"{"known_roles": ["OPS_ROLE"],
                "known_components": [{"address": "0x0000000000000000000000000000000000000001", "name": "Vault"}]}"#,
        )
        .unwrap();
        let registry = config.build_registry().unwrap();

        let vault = config.components().unwrap().remove(0);
        let scoped = RoleIdentity::new("OPS_ROLE", Some(vault)).unwrap();
        assert_eq!(registry.resolve(scoped.hash()).to_string(), "Role:OPS_ROLE@Vault");
    }

    #[test]
    fn bad_component_address_is_reported() {
        let config = AuditConfig {
            known_roles: vec![],
            known_components: vec![ComponentConfig {
                address: "0x1234".to_string(),
                name: None,
            }],
        };
        assert!(matches!(
            config.build_registry(),
            Err(ConfigError::InvalidComponentAddress { .. })
        ));
    }
}
