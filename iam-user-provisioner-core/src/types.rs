//! Core data types: IAM policy documents, statements, conditions, and
//! provisioning results.

use crate::credentials::AccessKey;
use crate::error::{ProvisionerError, ProvisionerResult};
use crate::role::Role;
use crate::user::UserSpec;
use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// IAM policy language version accepted by AWS.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => f.write_str("Allow"),
            Effect::Deny => f.write_str("Deny"),
        }
    }
}

/// One condition clause, e.g. `StringEquals` / `ec2:InstanceType` / `["t2.micro"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    /// Condition operator, such as `StringEquals`.
    pub test: String,
    /// Condition context key, such as `ec2:InstanceType`.
    pub variable: String,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new(
        test: impl Into<String>,
        variable: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            test: test.into(),
            variable: variable.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// The `Condition` block of a statement.
///
/// Serialized in the AWS grammar as `{"<test>": {"<variable>": [values]}}`.
/// Clauses sharing a test are grouped under the same operator key; clauses
/// repeating both test and variable have their values merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(pub Vec<Condition>);

impl Conditions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// Add a clause, folding its values into an existing clause with the
    /// same test and variable.
    pub fn push(&mut self, condition: Condition) {
        match self
            .0
            .iter_mut()
            .find(|c| c.test == condition.test && c.variable == condition.variable)
        {
            Some(existing) => {
                for value in condition.values {
                    if !existing.values.contains(&value) {
                        existing.values.push(value);
                    }
                }
            }
            None => self.0.push(condition),
        }
    }

    fn grouped(&self) -> BTreeMap<&str, BTreeMap<&str, Vec<&str>>> {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&str>>> = BTreeMap::new();
        for condition in &self.0 {
            let values = grouped
                .entry(condition.test.as_str())
                .or_default()
                .entry(condition.variable.as_str())
                .or_default();
            for value in &condition.values {
                if !values.contains(&value.as_str()) {
                    values.push(value.as_str());
                }
            }
        }
        grouped
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let grouped = self.grouped();
        let mut map = serializer.serialize_map(Some(grouped.len()))?;
        for (test, variables) in grouped {
            map.serialize_entry(test, &variables)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, BTreeMap<String, ConditionValues>> =
            BTreeMap::deserialize(deserializer)?;
        let mut conditions = Conditions::default();
        for (test, variables) in raw {
            for (variable, values) in variables {
                conditions.push(Condition {
                    test: test.clone(),
                    variable,
                    values: values.0,
                });
            }
        }
        Ok(conditions)
    }
}

/// IAM accepts either a bare string or an array wherever a list is allowed.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Condition values may be strings, booleans or numbers, alone or in an
/// array. Non-string scalars are kept in their JSON text form.
struct ConditionValues(Vec<String>);

impl<'de> Deserialize<'de> for ConditionValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fn scalar<E: serde::de::Error>(value: serde_json::Value) -> Result<String, E> {
            match value {
                serde_json::Value::String(s) => Ok(s),
                serde_json::Value::Bool(b) => Ok(b.to_string()),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                other => Err(E::custom(format!(
                    "condition value must be a string, boolean or number, got {other}"
                ))),
            }
        }

        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(scalar)
                .collect::<Result<_, _>>()
                .map(ConditionValues),
            value => scalar(value).map(|v| ConditionValues(vec![v])),
        }
    }
}

/// Serializes single-element lists as a bare string, matching how IAM
/// renders `Action` and `Resource`.
mod string_or_list {
    use super::OneOrMany;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        match values {
            [single] => single.serialize(serializer),
            _ => values.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        OneOrMany::deserialize(deserializer).map(OneOrMany::into_vec)
    }
}

/// A single rule within a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "string_or_list")]
    pub action: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "string_or_list")]
    pub not_action: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "string_or_list")]
    pub resource: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "string_or_list")]
    pub not_resource: Vec<String>,
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub condition: Conditions,
}

impl Statement {
    fn new(
        effect: Effect,
        actions: impl IntoIterator<Item = impl Into<String>>,
        resources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            sid: None,
            effect,
            action: actions.into_iter().map(Into::into).collect(),
            not_action: Vec::new(),
            resource: resources.into_iter().map(Into::into).collect(),
            not_resource: Vec::new(),
            condition: Conditions::default(),
        }
    }

    pub fn allow(
        actions: impl IntoIterator<Item = impl Into<String>>,
        resources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(Effect::Allow, actions, resources)
    }

    pub fn deny(
        actions: impl IntoIterator<Item = impl Into<String>>,
        resources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(Effect::Deny, actions, resources)
    }

    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition.push(condition);
        self
    }

    pub fn has_condition(&self) -> bool {
        !self.condition.is_empty()
    }
}

/// A complete IAM policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "statement_or_list")]
    pub statement: Vec<Statement>,
}

/// IAM accepts a lone statement object in place of the array.
fn statement_or_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Statement>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StatementOrList {
        Many(Vec<Statement>),
        One(Box<Statement>),
    }

    Ok(match StatementOrList::deserialize(deserializer)? {
        StatementOrList::Many(statements) => statements,
        StatementOrList::One(statement) => vec![*statement],
    })
}

impl PolicyDocument {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            id: None,
            statement: statements,
        }
    }

    /// Statements carrying the given effect, in document order.
    pub fn statements_with_effect(&self, effect: Effect) -> impl Iterator<Item = &Statement> {
        self.statement.iter().filter(move |s| s.effect == effect)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// What `apply` will do for one user. Building a plan has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionPlan {
    pub user: UserSpec,
    /// Role whose policy is attached. Never `Unassigned`.
    pub role: Role,
    pub policy_name: String,
    pub policy: PolicyDocument,
    /// The user had no role and was given the QA policy.
    pub fell_back: bool,
}

/// Result of a successful `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedUser {
    pub identity: UserSpec,
    pub user_id: String,
    pub arn: String,
    pub attached_policy_name: String,
    pub attached_policy: PolicyDocument,
    pub access_key: AccessKey,
    pub created_at: DateTime<Utc>,
}

/// Input to `destroy`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestroyRequest {
    pub name: String,
    pub force_destroy: bool,
    /// Access keys created by a previous `apply`; any other key blocks a
    /// non-forced destroy.
    pub known_access_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyReport {
    pub user: String,
    pub deleted_policies: Vec<String>,
    pub deleted_access_keys: Vec<String>,
}

/// Drift check between a plan and what the backend holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    pub user: String,
    pub policy_name: String,
    pub user_exists: bool,
    pub policy_matches: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_policy: Option<PolicyDocument>,
}

impl VerifyReport {
    pub fn is_in_sync(&self) -> bool {
        self.user_exists && self.policy_matches
    }

    /// Turn drift into an error.
    pub fn into_result(self) -> ProvisionerResult<()> {
        if !self.user_exists {
            return Err(ProvisionerError::UserNotFound(self.user));
        }
        if !self.policy_matches {
            return Err(ProvisionerError::PolicyMismatch {
                user: self.user,
                policy_name: self.policy_name,
            });
        }
        Ok(())
    }
}
