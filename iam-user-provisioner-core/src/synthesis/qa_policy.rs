//! QA policy: read-only describe/get/list access.

use crate::types::{PolicyDocument, Statement};
use std::sync::OnceLock;

pub const QA_ALLOW_SID: &str = "AllowReadOnlyDescribe";

pub const QA_READ_ONLY_SERVICES: [&str; 8] = [
    "ec2",
    "elasticbeanstalk",
    "s3",
    "rds",
    "cloudwatch",
    "logs",
    "autoscaling",
    "elasticloadbalancing",
];

const READ_ONLY_VERBS: [&str; 3] = ["Describe*", "Get*", "List*"];

/// The QA policy document.
pub fn qa_policy() -> &'static PolicyDocument {
    static POLICY: OnceLock<PolicyDocument> = OnceLock::new();
    POLICY.get_or_init(|| {
        let actions = QA_READ_ONLY_SERVICES.iter().flat_map(|service| {
            READ_ONLY_VERBS
                .iter()
                .map(move |verb| format!("{service}:{verb}"))
        });
        PolicyDocument::new(vec![
            Statement::allow(actions, ["*"]).with_sid(QA_ALLOW_SID)
        ])
    })
}
