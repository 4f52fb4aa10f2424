//! AWS IAM client wrapper for user, access key, and inline policy operations

use crate::aws::load_sdk_config;
use crate::backend::{IdentityBackend, UserRecord};
use crate::credentials::{AccessKey, AccessKeyStatus};
use crate::error::{ProvisionerError, ProvisionerResult};
use crate::types::PolicyDocument;
use async_trait::async_trait;
use aws_sdk_iam::types::StatusType;
use aws_sdk_iam::Client as IamClient;
use chrono::{DateTime, Utc};
use log::debug;

pub struct AwsIamBackend {
    client: IamClient,
}

impl AwsIamBackend {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    /// Build a backend from the default credential chain, pinned to `region`.
    pub async fn from_region(region: &str) -> Self {
        let config = load_sdk_config(region).await;
        Self::new(IamClient::new(&config))
    }
}

fn to_user_record(user: &aws_sdk_iam::types::User) -> UserRecord {
    let created = user.create_date();
    let created_at = DateTime::<Utc>::from_timestamp(created.secs(), created.subsec_nanos())
        .unwrap_or_else(Utc::now);
    UserRecord {
        name: user.user_name().to_string(),
        path: user.path().to_string(),
        user_id: user.user_id().to_string(),
        arn: user.arn().to_string(),
        created_at,
    }
}

/// Parse a policy document as returned by `GetUserPolicy` (URL-encoded JSON).
fn decode_policy_document(encoded: &str) -> ProvisionerResult<PolicyDocument> {
    let decoded = percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|e| {
            ProvisionerError::Serialization(format!("Failed to URL decode policy document: {e}"))
        })?;
    serde_json::from_str(&decoded).map_err(|e| {
        ProvisionerError::Serialization(format!("Failed to parse policy document JSON: {e}"))
    })
}

#[async_trait]
impl IdentityBackend for AwsIamBackend {
    async fn create_user(&self, name: &str, path: &str) -> ProvisionerResult<UserRecord> {
        let response = self
            .client
            .create_user()
            .user_name(name)
            .path(path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_entity_already_exists_exception() {
                    ProvisionerError::UserExists(name.to_string())
                } else {
                    ProvisionerError::backend(
                        "CreateUser",
                        format!("Failed to create user '{name}': {service_error}"),
                    )
                }
            })?;
        let user = response
            .user()
            .ok_or_else(|| ProvisionerError::backend("CreateUser", "response carried no user"))?;
        debug!("Created IAM user {}", user.arn());
        Ok(to_user_record(user))
    }

    async fn get_user(&self, name: &str) -> ProvisionerResult<Option<UserRecord>> {
        match self.client.get_user().user_name(name).send().await {
            Ok(response) => Ok(response.user().map(to_user_record)),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_entity_exception() {
                    Ok(None)
                } else {
                    Err(ProvisionerError::backend(
                        "GetUser",
                        format!("Failed to get user '{name}': {service_error}"),
                    ))
                }
            }
        }
    }

    async fn delete_user(&self, name: &str) -> ProvisionerResult<()> {
        self.client
            .delete_user()
            .user_name(name)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_entity_exception() {
                    ProvisionerError::UserNotFound(name.to_string())
                } else {
                    ProvisionerError::backend(
                        "DeleteUser",
                        format!("Failed to delete user '{name}': {service_error}"),
                    )
                }
            })?;
        Ok(())
    }

    async fn create_access_key(&self, user: &str) -> ProvisionerResult<AccessKey> {
        let response = self
            .client
            .create_access_key()
            .user_name(user)
            .send()
            .await
            .map_err(|e| {
                ProvisionerError::backend(
                    "CreateAccessKey",
                    format!("Failed to create access key for '{user}': {e}"),
                )
            })?;
        let key = response.access_key().ok_or_else(|| {
            ProvisionerError::backend("CreateAccessKey", "response carried no access key")
        })?;
        Ok(AccessKey {
            access_key_id: key.access_key_id().to_string(),
            secret_access_key: key.secret_access_key().to_string(),
            status: match key.status() {
                StatusType::Active => AccessKeyStatus::Active,
                _ => AccessKeyStatus::Inactive,
            },
        })
    }

    async fn list_access_keys(&self, user: &str) -> ProvisionerResult<Vec<String>> {
        let response = self
            .client
            .list_access_keys()
            .user_name(user)
            .send()
            .await
            .map_err(|e| {
                ProvisionerError::backend(
                    "ListAccessKeys",
                    format!("Failed to list access keys for '{user}': {e}"),
                )
            })?;
        Ok(response
            .access_key_metadata()
            .iter()
            .filter_map(|k| k.access_key_id().map(str::to_string))
            .collect())
    }

    async fn delete_access_key(&self, user: &str, access_key_id: &str) -> ProvisionerResult<()> {
        self.client
            .delete_access_key()
            .user_name(user)
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| {
                ProvisionerError::backend(
                    "DeleteAccessKey",
                    format!("Failed to delete access key {access_key_id}: {e}"),
                )
            })?;
        Ok(())
    }

    async fn put_user_policy(
        &self,
        user: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> ProvisionerResult<()> {
        let policy_json = document.to_json()?;
        self.client
            .put_user_policy()
            .user_name(user)
            .policy_name(policy_name)
            .policy_document(policy_json)
            .send()
            .await
            .map_err(|e| {
                ProvisionerError::backend(
                    "PutUserPolicy",
                    format!("Failed to put user policy '{policy_name}' on user '{user}': {e}"),
                )
            })?;
        Ok(())
    }

    async fn get_user_policy(
        &self,
        user: &str,
        policy_name: &str,
    ) -> ProvisionerResult<Option<PolicyDocument>> {
        match self
            .client
            .get_user_policy()
            .user_name(user)
            .policy_name(policy_name)
            .send()
            .await
        {
            Ok(response) => decode_policy_document(&response.policy_document).map(Some),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_entity_exception() {
                    Ok(None)
                } else {
                    Err(ProvisionerError::backend(
                        "GetUserPolicy",
                        format!("Failed to get user policy: {service_error}"),
                    ))
                }
            }
        }
    }

    async fn list_user_policies(&self, user: &str) -> ProvisionerResult<Vec<String>> {
        let response = self
            .client
            .list_user_policies()
            .user_name(user)
            .send()
            .await
            .map_err(|e| {
                ProvisionerError::backend(
                    "ListUserPolicies",
                    format!("Failed to list user policies: {e}"),
                )
            })?;
        Ok(response.policy_names)
    }

    async fn delete_user_policy(&self, user: &str, policy_name: &str) -> ProvisionerResult<()> {
        self.client
            .delete_user_policy()
            .user_name(user)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| {
                ProvisionerError::backend(
                    "DeleteUserPolicy",
                    format!("Failed to delete user policy '{policy_name}': {e}"),
                )
            })?;
        Ok(())
    }
}
