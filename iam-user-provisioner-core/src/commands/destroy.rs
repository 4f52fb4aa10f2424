//! Destroy logic for the provisioner service

use super::plan::inline_policy_name;
use crate::backend::IdentityBackend;
use crate::error::{ProvisionerError, ProvisionerResult};
use crate::role::Role;
use crate::types::{DestroyReport, DestroyRequest};
use log::info;

impl<B: IdentityBackend> super::service::ProvisionerService<B> {
    /// Remove a user together with its inline policies and access keys.
    ///
    /// Without `force_destroy`, a user holding access keys outside
    /// `known_access_keys` or inline policies this tool does not name is left alone.
    pub async fn destroy(&self, request: &DestroyRequest) -> ProvisionerResult<DestroyReport> {
        let name = request.name.as_str();
        if self.backend.get_user(name).await?.is_none() {
            return Err(ProvisionerError::UserNotFound(name.to_string()));
        }

        let access_keys = self.backend.list_access_keys(name).await?;
        let policies = self.backend.list_user_policies(name).await?;

        if !request.force_destroy {
            let managed = [
                inline_policy_name(name, Role::Dev),
                inline_policy_name(name, Role::Qa),
            ];
            let foreign_keys: Vec<&str> = access_keys
                .iter()
                .filter(|k| !request.known_access_keys.contains(k))
                .map(String::as_str)
                .collect();
            let foreign_policies: Vec<&str> = policies
                .iter()
                .filter(|p| !managed.contains(p))
                .map(String::as_str)
                .collect();

            if !foreign_keys.is_empty() || !foreign_policies.is_empty() {
                let mut reasons = Vec::new();
                if !foreign_keys.is_empty() {
                    reasons.push(format!("unmanaged access keys [{}]", foreign_keys.join(", ")));
                }
                if !foreign_policies.is_empty() {
                    reasons.push(format!(
                        "unmanaged inline policies [{}]",
                        foreign_policies.join(", ")
                    ));
                }
                return Err(ProvisionerError::DestroyBlocked {
                    user: name.to_string(),
                    reason: format!("{}; use force_destroy", reasons.join(" and ")),
                });
            }
        }

        for policy in &policies {
            self.backend.delete_user_policy(name, policy).await?;
            info!("Deleted inline policy '{policy}' from {name}");
        }
        for key in &access_keys {
            self.backend.delete_access_key(name, key).await?;
            info!("Deleted access key {key} from {name}");
        }
        self.backend.delete_user(name).await?;
        info!("Deleted user {name}");

        Ok(DestroyReport {
            user: name.to_string(),
            deleted_policies: policies,
            deleted_access_keys: access_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::IdentityBackend;
    use crate::commands::ProvisionerService;
    use crate::error::ProvisionerError;
    use crate::role::{Role, SelectionMode};
    use crate::synthesis::qa_policy;
    use crate::types::DestroyRequest;
    use crate::user::UserSpec;

    async fn provisioned(name: &str) -> (ProvisionerService<crate::backend::InMemoryBackend>, String) {
        let service = ProvisionerService::simulated(SelectionMode::default());
        let plan = service.plan(&UserSpec::new(name, Role::Dev)).unwrap();
        let user = service.apply(&plan).await.unwrap();
        (service, user.access_key.access_key_id)
    }

    #[tokio::test]
    async fn test_destroy_known_resources() {
        let (service, key_id) = provisioned("alice").await;
        let report = service
            .destroy(&DestroyRequest {
                name: "alice".into(),
                force_destroy: false,
                known_access_keys: vec![key_id.clone()],
            })
            .await
            .unwrap();
        assert_eq!(report.deleted_access_keys, vec![key_id]);
        assert_eq!(report.deleted_policies, vec!["alice-dev-policy"]);
        assert_eq!(service.backend().user_count(), 0);
    }

    #[tokio::test]
    async fn test_destroy_blocked_by_foreign_key() {
        let (service, key_id) = provisioned("alice").await;
        let foreign = service.backend().create_access_key("alice").await.unwrap();

        let request = DestroyRequest {
            name: "alice".into(),
            force_destroy: false,
            known_access_keys: vec![key_id],
        };
        let err = service.destroy(&request).await.unwrap_err();
        match err {
            ProvisionerError::DestroyBlocked { user, reason } => {
                assert_eq!(user, "alice");
                assert!(reason.contains(&foreign.access_key_id));
            }
            other => panic!("expected DestroyBlocked, got {other:?}"),
        }
        assert_eq!(service.backend().user_count(), 1);
    }

    #[tokio::test]
    async fn test_destroy_blocked_by_foreign_policy_unless_forced() {
        let (service, key_id) = provisioned("alice").await;
        service
            .backend()
            .put_user_policy("alice", "hand-made", qa_policy())
            .await
            .unwrap();

        let mut request = DestroyRequest {
            name: "alice".into(),
            force_destroy: false,
            known_access_keys: vec![key_id],
        };
        assert!(matches!(
            service.destroy(&request).await,
            Err(ProvisionerError::DestroyBlocked { .. })
        ));

        request.force_destroy = true;
        let report = service.destroy(&request).await.unwrap();
        assert_eq!(report.deleted_policies.len(), 2);
        assert_eq!(service.backend().user_count(), 0);
    }

    #[tokio::test]
    async fn test_destroy_missing_user() {
        let service = ProvisionerService::simulated(SelectionMode::default());
        let err = service
            .destroy(&DestroyRequest {
                name: "ghost".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::UserNotFound(_)));
    }
}
