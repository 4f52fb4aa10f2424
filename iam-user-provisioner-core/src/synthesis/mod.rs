//! Policy synthesis (fixed, deterministic policy documents)

mod dev_policy;
mod qa_policy;

pub use dev_policy::{
    dev_policy, ALLOWED_INSTANCE_TYPES, DEV_ALLOW_SID, DEV_DENY_SID, ENVIRONMENT_LIFECYCLE_ACTIONS,
    RUN_INSTANCES_RESOURCES,
};
pub use qa_policy::{qa_policy, QA_ALLOW_SID, QA_READ_ONLY_SERVICES};
