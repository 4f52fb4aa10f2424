//! The user identity to provision.

use crate::error::ProvisionerResult;
use crate::role::Role;
use crate::validation::{validate_path, validate_user_name};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PATH: &str = "/";

/// Desired state of one IAM user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    pub name: String,
    pub path: String,
    /// Destroy the user even if it holds keys or policies this tool did not create.
    pub force_destroy: bool,
    pub role: Role,
}

impl UserSpec {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            path: DEFAULT_PATH.to_string(),
            force_destroy: false,
            role,
        }
    }

    /// Build a spec from the `devuser`/`qauser` flag pair.
    pub fn from_flags(name: impl Into<String>, is_dev: bool, is_qa: bool) -> Self {
        Self::new(name, Role::from_flags(is_dev, is_qa))
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_force_destroy(mut self, force_destroy: bool) -> Self {
        self.force_destroy = force_destroy;
        self
    }

    pub fn validate(&self) -> ProvisionerResult<()> {
        validate_user_name(&self.name)?;
        validate_path(&self.path)
    }
}
