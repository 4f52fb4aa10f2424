//! Plan creation logic for the provisioner service

use crate::error::ProvisionerResult;
use crate::role::{select_policy, Role};
use crate::types::ProvisionPlan;
use crate::user::UserSpec;
use log::info;

/// Name of the inline policy carrying `role`'s document for `user`.
pub fn inline_policy_name(user: &str, role: Role) -> String {
    format!("{user}-{role}-policy")
}

impl<B> super::service::ProvisionerService<B> {
    /// Validate `spec` and decide which policy it gets. No side effects.
    pub fn plan(&self, spec: &UserSpec) -> ProvisionerResult<ProvisionPlan> {
        spec.validate()?;

        let selection = select_policy(&spec.name, spec.role, self.mode)?;
        let policy_name = inline_policy_name(&spec.name, selection.effective_role);

        info!(
            "Planned user '{}' (path {}) with {} policy '{}'",
            spec.name, spec.path, selection.effective_role, policy_name
        );

        Ok(ProvisionPlan {
            user: spec.clone(),
            role: selection.effective_role,
            policy_name,
            policy: selection.policy.clone(),
            fell_back: selection.fell_back,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ProvisionerService;
    use crate::error::ProvisionerError;
    use crate::role::SelectionMode;
    use crate::synthesis::{dev_policy, qa_policy};
    use rstest::rstest;

    #[rstest]
    #[case(true, false, Role::Dev)]
    #[case(true, true, Role::Dev)]
    #[case(false, true, Role::Qa)]
    #[case(false, false, Role::Qa)]
    fn test_plan_selects_policy_by_flags(
        #[case] dev: bool,
        #[case] qa: bool,
        #[case] expected: Role,
    ) {
        let service = ProvisionerService::simulated(SelectionMode::FallbackToQa);
        let plan = service.plan(&UserSpec::from_flags("alice", dev, qa)).unwrap();
        assert_eq!(plan.role, expected);
        let expected_policy = match expected {
            Role::Dev => dev_policy(),
            _ => qa_policy(),
        };
        assert_eq!(&plan.policy, expected_policy);
        assert_eq!(plan.fell_back, !dev && !qa);
    }

    #[test]
    fn test_plan_names_inline_policy() {
        let service = ProvisionerService::simulated(SelectionMode::default());
        let plan = service.plan(&UserSpec::from_flags("alice", true, false)).unwrap();
        assert_eq!(plan.policy_name, "alice-dev-policy");
    }

    #[test]
    fn test_plan_strict_rejects_unassigned() {
        let service = ProvisionerService::simulated(SelectionMode::Strict);
        let err = service
            .plan(&UserSpec::from_flags("alice", false, false))
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::NoRole(_)));
    }

    #[test]
    fn test_plan_validates_spec_first() {
        let service = ProvisionerService::simulated(SelectionMode::default());
        let err = service
            .plan(&UserSpec::from_flags("bad name", true, false))
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::InvalidUserName { .. }));
    }

    #[test]
    fn test_plan_serializes_policy_as_aws_json() {
        let service = ProvisionerService::simulated(SelectionMode::default());
        let plan = service.plan(&UserSpec::from_flags("alice", false, true)).unwrap();
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["policyName"], "alice-qa-policy");
        assert_eq!(value["policy"]["Version"], "2012-10-17");
        assert_eq!(value["user"]["name"], "alice");
    }
}
