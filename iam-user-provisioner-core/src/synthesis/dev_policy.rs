//! Dev policy: may not tear down Elastic Beanstalk environments, and may only
//! launch small EC2 instances.

use crate::types::{Condition, PolicyDocument, Statement};
use std::sync::OnceLock;

pub const DEV_DENY_SID: &str = "DenyEnvironmentLifecycle";
pub const DEV_ALLOW_SID: &str = "AllowLimitedRunInstances";

pub const ENVIRONMENT_LIFECYCLE_ACTIONS: [&str; 5] = [
    "elasticbeanstalk:CreateEnvironment",
    "elasticbeanstalk:RebuildEnvironment",
    "elasticbeanstalk:TerminateEnvironment",
    "elasticbeanstalk:RestartAppServer",
    "elasticbeanstalk:SwapEnvironmentCNAMEs",
];

pub const RUN_INSTANCES_RESOURCES: [&str; 2] =
    ["arn:aws:ec2:*:*:instance/*", "arn:aws:ec2:*::image/ami-*"];

pub const ALLOWED_INSTANCE_TYPES: [&str; 2] = ["t2.micro", "t2.small"];

/// The Dev policy document.
pub fn dev_policy() -> &'static PolicyDocument {
    static POLICY: OnceLock<PolicyDocument> = OnceLock::new();
    POLICY.get_or_init(|| {
        PolicyDocument::new(vec![
            Statement::deny(ENVIRONMENT_LIFECYCLE_ACTIONS, ["*"]).with_sid(DEV_DENY_SID),
            Statement::allow(["ec2:RunInstances"], RUN_INSTANCES_RESOURCES)
                .with_sid(DEV_ALLOW_SID)
                .with_condition(Condition::new(
                    "StringEquals",
                    "ec2:InstanceType",
                    ALLOWED_INSTANCE_TYPES,
                )),
        ])
    })
}
