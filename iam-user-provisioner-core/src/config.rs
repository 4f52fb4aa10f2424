//! Provisioner configuration: the flag surface, loadable from TOML.
//!
//! ```toml
//! name = "alice"
//! path = "/engineering/"
//! devuser = true
//! qauser = false
//! force_destroy = false
//! region = "us-east-1"
//! strict_role = false
//! ```

use crate::error::{ProvisionerError, ProvisionerResult};
use crate::role::SelectionMode;
use crate::user::{UserSpec, DEFAULT_PATH};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Region every IAM client is pinned to unless configured otherwise.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Every field is optional so that a file and command-line flags can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionerConfig {
    pub name: Option<String>,
    pub path: Option<String>,
    pub force_destroy: Option<bool>,
    pub devuser: Option<bool>,
    pub qauser: Option<bool>,
    pub region: Option<String>,
    pub strict_role: Option<bool>,
}

impl ProvisionerConfig {
    pub fn from_toml_str(raw: &str) -> ProvisionerResult<Self> {
        toml::from_str(raw).map_err(|e| ProvisionerError::config(format!("invalid TOML: {e}")))
    }

    pub fn load(path: &Path) -> ProvisionerResult<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProvisionerError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    #[must_use]
    pub fn overlay(self, overrides: Self) -> Self {
        Self {
            name: overrides.name.or(self.name),
            path: overrides.path.or(self.path),
            force_destroy: overrides.force_destroy.or(self.force_destroy),
            devuser: overrides.devuser.or(self.devuser),
            qauser: overrides.qauser.or(self.qauser),
            region: overrides.region.or(self.region),
            strict_role: overrides.strict_role.or(self.strict_role),
        }
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn selection_mode(&self) -> SelectionMode {
        SelectionMode::from_strict(self.strict_role.unwrap_or(false))
    }

    /// Build the user spec. Only `name` is required.
    pub fn user_spec(&self) -> ProvisionerResult<UserSpec> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| ProvisionerError::config("user name is required"))?;
        Ok(UserSpec::from_flags(
            name,
            self.devuser.unwrap_or(false),
            self.qauser.unwrap_or(false),
        )
        .with_path(self.path.clone().unwrap_or_else(|| DEFAULT_PATH.to_string()))
        .with_force_destroy(self.force_destroy.unwrap_or(false)))
    }
}
