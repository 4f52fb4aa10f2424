//! Role selection: which policy document a user gets.

use crate::error::{ProvisionerError, ProvisionerResult};
use crate::synthesis::{dev_policy, qa_policy};
use crate::types::PolicyDocument;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a provisioned user is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dev,
    Qa,
    /// Neither `devuser` nor `qauser` was set.
    Unassigned,
}

impl Role {
    /// Fold the `devuser`/`qauser` flag pair into a role. The dev flag wins
    /// when both are set.
    pub fn from_flags(is_dev: bool, is_qa: bool) -> Self {
        match (is_dev, is_qa) {
            (true, true) => {
                warn!("both devuser and qauser are set; devuser takes precedence");
                Role::Dev
            }
            (true, false) => Role::Dev,
            (false, true) => Role::Qa,
            (false, false) => Role::Unassigned,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Dev => "dev",
            Role::Qa => "qa",
            Role::Unassigned => "unassigned",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with [`Role::Unassigned`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Attach the QA policy, as the flag-based configuration always did.
    #[default]
    FallbackToQa,
    /// Reject users without a role.
    Strict,
}

impl SelectionMode {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            SelectionMode::Strict
        } else {
            SelectionMode::FallbackToQa
        }
    }
}

/// Outcome of a policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Role whose document was chosen. Never `Unassigned`.
    pub effective_role: Role,
    pub policy: &'static PolicyDocument,
    /// True when an unassigned user was given the QA policy.
    pub fell_back: bool,
}

/// Pick the policy document for `role`.
///
/// `user` only feeds diagnostics.
pub fn select_policy(user: &str, role: Role, mode: SelectionMode) -> ProvisionerResult<Selection> {
    match (role, mode) {
        (Role::Dev, _) => Ok(Selection {
            effective_role: Role::Dev,
            policy: dev_policy(),
            fell_back: false,
        }),
        (Role::Qa, _) => Ok(Selection {
            effective_role: Role::Qa,
            policy: qa_policy(),
            fell_back: false,
        }),
        (Role::Unassigned, SelectionMode::FallbackToQa) => {
            warn!("user '{user}' has no role; attaching the QA policy");
            Ok(Selection {
                effective_role: Role::Qa,
                policy: qa_policy(),
                fell_back: true,
            })
        }
        (Role::Unassigned, SelectionMode::Strict) => Err(ProvisionerError::NoRole(user.to_string())),
    }
}
