//! In-process backend. Backs the tests and `plan --simulate`.

use super::{IdentityBackend, UserRecord};
use crate::credentials::{generate_access_key, AccessKey};
use crate::error::{ProvisionerError, ProvisionerResult};
use crate::types::PolicyDocument;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

const SIMULATED_ACCOUNT: &str = "000000000000";

#[derive(Debug)]
struct StoredUser {
    record: UserRecord,
    access_keys: Vec<AccessKey>,
    policies: BTreeMap<String, PolicyDocument>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    users: Mutex<HashMap<String, StoredUser>>,
    fail_on: Mutex<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named operation (e.g. `"PutUserPolicy"`) fail once.
    pub fn fail_next(&self, operation: &str) {
        *lock(&self.fail_on) = Some(operation.to_string());
    }

    pub fn user_count(&self) -> usize {
        lock(&self.users).len()
    }

    fn check_failure(&self, operation: &str) -> ProvisionerResult<()> {
        let mut fail_on = lock(&self.fail_on);
        if fail_on.as_deref() == Some(operation) {
            *fail_on = None;
            return Err(ProvisionerError::backend(operation, "injected failure"));
        }
        Ok(())
    }

    fn with_user<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut StoredUser) -> ProvisionerResult<T>,
    ) -> ProvisionerResult<T> {
        let mut users = lock(&self.users);
        let user = users
            .get_mut(name)
            .ok_or_else(|| ProvisionerError::UserNotFound(name.to_string()))?;
        f(user)
    }
}

// A poisoned lock only means another test thread panicked; the map is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl IdentityBackend for InMemoryBackend {
    async fn create_user(&self, name: &str, path: &str) -> ProvisionerResult<UserRecord> {
        self.check_failure("CreateUser")?;
        let mut users = lock(&self.users);
        if users.contains_key(name) {
            return Err(ProvisionerError::UserExists(name.to_string()));
        }

        let suffix = uuid::Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        let record = UserRecord {
            name: name.to_string(),
            path: path.to_string(),
            user_id: format!("AIDA{}", &suffix[..17]),
            arn: format!("arn:aws:iam::{SIMULATED_ACCOUNT}:user{path}{name}"),
            created_at: Utc::now(),
        };
        debug!("created simulated user {}", record.arn);
        users.insert(
            name.to_string(),
            StoredUser {
                record: record.clone(),
                access_keys: Vec::new(),
                policies: BTreeMap::new(),
            },
        );
        Ok(record)
    }

    async fn get_user(&self, name: &str) -> ProvisionerResult<Option<UserRecord>> {
        self.check_failure("GetUser")?;
        Ok(lock(&self.users).get(name).map(|u| u.record.clone()))
    }

    async fn delete_user(&self, name: &str) -> ProvisionerResult<()> {
        self.check_failure("DeleteUser")?;
        let mut users = lock(&self.users);
        let user = users
            .get(name)
            .ok_or_else(|| ProvisionerError::UserNotFound(name.to_string()))?;
        if !user.access_keys.is_empty() || !user.policies.is_empty() {
            return Err(ProvisionerError::backend(
                "DeleteUser",
                "cannot delete entity, must delete access keys and policies first",
            ));
        }
        users.remove(name);
        Ok(())
    }

    async fn create_access_key(&self, user: &str) -> ProvisionerResult<AccessKey> {
        self.check_failure("CreateAccessKey")?;
        self.with_user(user, |stored| {
            if stored.access_keys.len() >= 2 {
                return Err(ProvisionerError::backend(
                    "CreateAccessKey",
                    "cannot exceed quota for AccessKeysPerUser: 2",
                ));
            }
            let key = generate_access_key()?;
            stored.access_keys.push(key.clone());
            Ok(key)
        })
    }

    async fn list_access_keys(&self, user: &str) -> ProvisionerResult<Vec<String>> {
        self.check_failure("ListAccessKeys")?;
        self.with_user(user, |stored| {
            Ok(stored
                .access_keys
                .iter()
                .map(|k| k.access_key_id.clone())
                .collect())
        })
    }

    async fn delete_access_key(&self, user: &str, access_key_id: &str) -> ProvisionerResult<()> {
        self.check_failure("DeleteAccessKey")?;
        self.with_user(user, |stored| {
            let before = stored.access_keys.len();
            stored
                .access_keys
                .retain(|k| k.access_key_id != access_key_id);
            if stored.access_keys.len() == before {
                return Err(ProvisionerError::backend(
                    "DeleteAccessKey",
                    format!("access key {access_key_id} not found"),
                ));
            }
            Ok(())
        })
    }

    async fn put_user_policy(
        &self,
        user: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> ProvisionerResult<()> {
        self.check_failure("PutUserPolicy")?;
        self.with_user(user, |stored| {
            stored
                .policies
                .insert(policy_name.to_string(), document.clone());
            Ok(())
        })
    }

    async fn get_user_policy(
        &self,
        user: &str,
        policy_name: &str,
    ) -> ProvisionerResult<Option<PolicyDocument>> {
        self.check_failure("GetUserPolicy")?;
        self.with_user(user, |stored| Ok(stored.policies.get(policy_name).cloned()))
    }

    async fn list_user_policies(&self, user: &str) -> ProvisionerResult<Vec<String>> {
        self.check_failure("ListUserPolicies")?;
        self.with_user(user, |stored| Ok(stored.policies.keys().cloned().collect()))
    }

    async fn delete_user_policy(&self, user: &str, policy_name: &str) -> ProvisionerResult<()> {
        self.check_failure("DeleteUserPolicy")?;
        self.with_user(user, |stored| {
            stored.policies.remove(policy_name).map(|_| ()).ok_or_else(|| {
                ProvisionerError::backend(
                    "DeleteUserPolicy",
                    format!("policy {policy_name} not found"),
                )
            })
        })
    }
}
