//! Identity backends: where users, access keys and inline policies live.

mod memory;

pub use memory::InMemoryBackend;

use crate::credentials::AccessKey;
use crate::error::ProvisionerResult;
use crate::types::PolicyDocument;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub path: String,
    pub user_id: String,
    pub arn: String,
    pub created_at: DateTime<Utc>,
}

/// The IAM operations the provisioner needs.
///
/// Implementations report a missing user as `ProvisionerError::UserNotFound`
/// and a name collision as `ProvisionerError::UserExists`.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn create_user(&self, name: &str, path: &str) -> ProvisionerResult<UserRecord>;

    async fn get_user(&self, name: &str) -> ProvisionerResult<Option<UserRecord>>;

    async fn delete_user(&self, name: &str) -> ProvisionerResult<()>;

    async fn create_access_key(&self, user: &str) -> ProvisionerResult<AccessKey>;

    /// Access key ids bound to `user`.
    async fn list_access_keys(&self, user: &str) -> ProvisionerResult<Vec<String>>;

    async fn delete_access_key(&self, user: &str, access_key_id: &str) -> ProvisionerResult<()>;

    /// Create or replace an inline policy.
    async fn put_user_policy(
        &self,
        user: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> ProvisionerResult<()>;

    async fn get_user_policy(
        &self,
        user: &str,
        policy_name: &str,
    ) -> ProvisionerResult<Option<PolicyDocument>>;

    async fn list_user_policies(&self, user: &str) -> ProvisionerResult<Vec<String>>;

    async fn delete_user_policy(&self, user: &str, policy_name: &str) -> ProvisionerResult<()>;
}
