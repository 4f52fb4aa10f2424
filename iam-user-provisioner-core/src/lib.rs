//! This crate provides the core business logic for the IAM user provisioner:
//! - The Dev and QA policy documents
//! - Role selection (which document a user gets)
//! - User name/path validation and policy linting
//! - Provisioning users, access keys and inline policies through an identity backend
//!

mod aws;
mod backend;
pub mod commands;
mod config;
mod credentials;
mod error;
mod role;
mod synthesis;
mod types;
mod user;
mod validation;

// Re-exports for a small, focused public API
pub use aws::AwsIamBackend;
pub use backend::{IdentityBackend, InMemoryBackend, UserRecord};
pub use commands::{inline_policy_name, ProvisionerService};
pub use config::{ProvisionerConfig, DEFAULT_REGION};
pub use credentials::{AccessKey, AccessKeyStatus};
pub use error::{ProvisionerError, ProvisionerResult};
pub use role::{select_policy, Role, Selection, SelectionMode};
pub use synthesis::{
    dev_policy, qa_policy, ALLOWED_INSTANCE_TYPES, DEV_ALLOW_SID, DEV_DENY_SID,
    ENVIRONMENT_LIFECYCLE_ACTIONS, QA_ALLOW_SID, QA_READ_ONLY_SERVICES, RUN_INSTANCES_RESOURCES,
};
pub use types::{
    Condition, Conditions, DestroyReport, DestroyRequest, Effect, PolicyDocument, ProvisionPlan,
    ProvisionedUser, Statement, VerifyReport, POLICY_VERSION,
};
pub use user::{UserSpec, DEFAULT_PATH};
pub use validation::{lint_policy, validate_path, validate_user_name, PolicyIssue};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_provision_alice_as_dev() {
        let service = ProvisionerService::simulated(SelectionMode::default());
        let plan = service
            .plan(&UserSpec::from_flags("alice", true, false))
            .expect("should plan");
        let user = service.apply(&plan).await.expect("should apply");

        assert_eq!(user.identity.name, "alice");
        assert_eq!(
            user.attached_policy.to_json().unwrap(),
            dev_policy().to_json().unwrap()
        );
        assert!(!user.access_key.access_key_id.is_empty());
        assert!(!user.access_key.secret_access_key.is_empty());
    }
}
