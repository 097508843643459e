use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::utils::{MODULE_SCOPE_NAMES, RESERVED_WORDS, is_identifier};

/// Identifier through which compiled bodies reach their reference slots.
pub const DEFAULT_REGISTRY_IDENT: &str = "refs";

/// Options for one packing call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackOptions {
    /// Preferred symbol for the root routine.
    #[serde(default = "default_root_symbol")]
    pub root_symbol: String,
    #[serde(default = "default_registry_ident")]
    pub registry_ident: String,
    /// Module path runtime helpers are required from.
    #[serde(default = "default_runtime_path")]
    pub runtime_path: String,
    /// Emit a `'use strict';` prologue.
    #[serde(default = "default_strict_mode")]
    pub strict_mode: bool,
    /// Highest numeric suffix tried before giving up on a name.
    #[serde(default = "default_max_name_suffix")]
    pub max_name_suffix: usize,
    /// Extra identifiers no symbol may take.
    #[serde(default)]
    pub reserved: Vec<String>,
}

fn default_root_symbol() -> String {
    "validate".to_string()
}

fn default_registry_ident() -> String {
    DEFAULT_REGISTRY_IDENT.to_string()
}

fn default_runtime_path() -> String {
    "ajv/lib/compile".to_string()
}

fn default_strict_mode() -> bool {
    true
}

fn default_max_name_suffix() -> usize {
    10_000
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            root_symbol: default_root_symbol(),
            registry_ident: default_registry_ident(),
            runtime_path: default_runtime_path(),
            strict_mode: default_strict_mode(),
            max_name_suffix: default_max_name_suffix(),
            reserved: Vec::new(),
        }
    }
}

impl PackOptions {
    /// Validate option values.
    ///
    /// Returns an error if an identifier option is not a usable binding name
    /// or the runtime path is empty.
    pub fn validate(&self) -> Result<()> {
        check_binding("rootSymbol", &self.root_symbol)?;
        check_binding("registryIdent", &self.registry_ident)?;

        for name in &self.reserved {
            if !is_identifier(name) {
                bail!("Invalid identifier in 'reserved': \"{}\"", name);
            }
        }

        if self.runtime_path.trim().is_empty() {
            bail!("'runtimePath' must not be empty");
        }

        Ok(())
    }

    /// Every identifier the allocator must avoid, besides body identifiers.
    pub fn reserved_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for word in RESERVED_WORDS.iter().chain(MODULE_SCOPE_NAMES) {
            names.push(word);
        }
        names.push(&self.registry_ident);
        names.extend(self.reserved.iter().map(String::as_str));
        names
    }
}

fn check_binding(option: &str, name: &str) -> Result<()> {
    if !is_identifier(name) {
        bail!("Invalid identifier in '{}': \"{}\"", option, name);
    }
    if RESERVED_WORDS.contains(&name) || MODULE_SCOPE_NAMES.contains(&name) {
        bail!("'{}' uses reserved word \"{}\"", option, name);
    }
    Ok(())
}
