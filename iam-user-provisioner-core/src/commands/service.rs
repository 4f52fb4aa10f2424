//! Provisioner Service Layer
//!
//! This module provides the main service interface that encapsulates all business logic
//! for provisioning IAM users. The service holds an identity backend and provides
//! high-level operations (plan, apply, destroy, verify) used by the CLI.

use crate::aws::AwsIamBackend;
use crate::backend::{IdentityBackend, InMemoryBackend};
use crate::role::SelectionMode;

/// Main service struct that holds the identity backend and the role selection mode
pub struct ProvisionerService<B> {
    pub(crate) backend: B,
    pub(crate) mode: SelectionMode,
}

impl<B: IdentityBackend> ProvisionerService<B> {
    pub fn new(backend: B, mode: SelectionMode) -> Self {
        Self { backend, mode }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    // plan() method implementation is in plan.rs
    // apply() method implementation is in apply.rs
    // destroy() method implementation is in destroy.rs
    // verify() method implementation is in verify.rs
}

impl ProvisionerService<AwsIamBackend> {
    /// Create a service backed by IAM.
    ///
    /// The configuration is loaded using the default credential provider chain,
    /// pinned to `region`.
    pub async fn aws(region: &str, mode: SelectionMode) -> Self {
        Self::new(AwsIamBackend::from_region(region).await, mode)
    }
}

impl ProvisionerService<InMemoryBackend> {
    /// Create a service backed by an empty in-process store.
    pub fn simulated(mode: SelectionMode) -> Self {
        Self::new(InMemoryBackend::new(), mode)
    }
}
