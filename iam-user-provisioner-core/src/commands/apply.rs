//! Apply logic for the provisioner service

use crate::backend::IdentityBackend;
use crate::error::ProvisionerResult;
use crate::types::{ProvisionPlan, ProvisionedUser};
use log::{info, warn};

impl<B: IdentityBackend> super::service::ProvisionerService<B> {
    /// Create the user, its access key, and its inline policy.
    ///
    /// If the key or the policy cannot be created, whatever was already created
    /// is removed again and the original error is returned.
    pub async fn apply(&self, plan: &ProvisionPlan) -> ProvisionerResult<ProvisionedUser> {
        plan.user.validate()?;
        let name = plan.user.name.as_str();

        let record = self.backend.create_user(name, &plan.user.path).await?;
        info!("Created user {}", record.arn);

        let access_key = match self.backend.create_access_key(name).await {
            Ok(key) => key,
            Err(e) => {
                self.rollback(name, None).await;
                return Err(e);
            }
        };
        info!("Created access key {} for {name}", access_key.access_key_id);

        if let Err(e) = self
            .backend
            .put_user_policy(name, &plan.policy_name, &plan.policy)
            .await
        {
            self.rollback(name, Some(&access_key.access_key_id)).await;
            return Err(e);
        }
        info!("Attached {} policy '{}' to {name}", plan.role, plan.policy_name);

        Ok(ProvisionedUser {
            identity: plan.user.clone(),
            user_id: record.user_id,
            arn: record.arn,
            attached_policy_name: plan.policy_name.clone(),
            attached_policy: plan.policy.clone(),
            access_key,
            created_at: record.created_at,
        })
    }

    /// Best-effort removal of a partially created user.
    async fn rollback(&self, name: &str, access_key_id: Option<&str>) {
        warn!("Rolling back partially created user '{name}'");
        if let Some(key_id) = access_key_id {
            if let Err(e) = self.backend.delete_access_key(name, key_id).await {
                warn!("Rollback could not delete access key {key_id}: {e}");
            }
        }
        if let Err(e) = self.backend.delete_user(name).await {
            warn!("Rollback could not delete user '{name}': {e}");
        }
    }
}
