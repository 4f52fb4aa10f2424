//! Drift check between a plan and the backend

use crate::backend::IdentityBackend;
use crate::error::ProvisionerResult;
use crate::types::{ProvisionPlan, VerifyReport};
use log::{debug, warn};

impl<B: IdentityBackend> super::service::ProvisionerService<B> {
    /// Read the planned inline policy back and compare it with the plan.
    pub async fn verify(&self, plan: &ProvisionPlan) -> ProvisionerResult<VerifyReport> {
        let name = plan.user.name.as_str();
        let mut report = VerifyReport {
            user: name.to_string(),
            policy_name: plan.policy_name.clone(),
            user_exists: false,
            policy_matches: false,
            actual_policy: None,
        };

        if self.backend.get_user(name).await?.is_none() {
            warn!("User '{name}' does not exist");
            return Ok(report);
        }
        report.user_exists = true;

        let actual = self
            .backend
            .get_user_policy(name, &plan.policy_name)
            .await?;
        report.policy_matches = actual.as_ref() == Some(&plan.policy);
        if report.policy_matches {
            debug!("Policy '{}' on {name} matches the plan", plan.policy_name);
        } else {
            warn!("Policy '{}' on {name} has drifted", plan.policy_name);
        }
        report.actual_policy = actual;
        Ok(report)
    }
}
