//! Structural checks for policy documents read from disk or from IAM.

use crate::types::{PolicyDocument, POLICY_VERSION};
use serde::Serialize;
use std::fmt;

/// A structural problem found in a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyIssue {
    /// Index of the offending statement, if the issue is statement-level.
    pub statement: Option<usize>,
    pub message: String,
}

impl fmt::Display for PolicyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.statement {
            Some(index) => write!(f, "Statement[{index}]: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Report structural problems. An empty result means the document is well-formed.
pub fn lint_policy(doc: &PolicyDocument) -> Vec<PolicyIssue> {
    let mut issues = Vec::new();
    let document_issue = |message: String| PolicyIssue {
        statement: None,
        message,
    };

    if doc.version != POLICY_VERSION {
        issues.push(document_issue(format!(
            "unsupported Version '{}', expected '{POLICY_VERSION}'",
            doc.version
        )));
    }
    if doc.statement.is_empty() {
        issues.push(document_issue("policy has no statements".to_string()));
    }

    for (index, stmt) in doc.statement.iter().enumerate() {
        let mut push = |message: String| {
            issues.push(PolicyIssue {
                statement: Some(index),
                message,
            });
        };
        match (stmt.action.is_empty(), stmt.not_action.is_empty()) {
            (true, true) => push("Action or NotAction must not be empty".to_string()),
            (false, false) => push("Action and NotAction must not both be set".to_string()),
            _ => {}
        }
        match (stmt.resource.is_empty(), stmt.not_resource.is_empty()) {
            (true, true) => push("Resource or NotResource must not be empty".to_string()),
            (false, false) => push("Resource and NotResource must not both be set".to_string()),
            _ => {}
        }
        for action in stmt.action.iter().chain(&stmt.not_action) {
            if action != "*" && !is_service_action(action) {
                push(format!("action '{action}' is not of the form service:Action"));
            }
        }
        for condition in stmt.condition.iter() {
            if condition.values.is_empty() {
                push(format!(
                    "condition {} on '{}' has no values",
                    condition.test, condition.variable
                ));
            }
        }
    }

    issues
}

fn is_service_action(action: &str) -> bool {
    match action.split_once(':') {
        Some((service, name)) => {
            !service.is_empty()
                && service
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                && !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '*' || c == '?')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::{dev_policy, qa_policy};
    use crate::types::Statement;

    #[test]
    fn test_builtin_policies_are_clean() {
        assert!(lint_policy(dev_policy()).is_empty());
        assert!(lint_policy(qa_policy()).is_empty());
    }

    #[test]
    fn test_reports_malformed_actions() {
        let doc = PolicyDocument::new(vec![Statement::allow(["GetObject", "s3:Get*"], ["*"])]);
        let issues = lint_policy(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].statement, Some(0));
        assert!(issues[0].message.contains("GetObject"));
    }

    #[test]
    fn test_reports_empty_document_and_bad_version() {
        let mut doc = PolicyDocument::new(vec![]);
        doc.version = "2008-10-17".to_string();
        let issues = lint_policy(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.statement.is_none()));
    }

    #[test]
    fn test_reports_empty_resource() {
        let doc = PolicyDocument::new(vec![Statement::deny(["iam:*"], Vec::<String>::new())]);
        let issues = lint_policy(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].to_string(),
            "Statement[0]: Resource or NotResource must not be empty"
        );
    }

    #[test]
    fn test_not_action_statement_is_clean() {
        let doc = PolicyDocument::from_json(
            r#"{"Version": "2012-10-17", "Statement": {"Effect": "Deny",
                "NotAction": ["iam:*", "sts:Get*"], "NotResource": "arn:aws:s3:::public/*",
                "Condition": {"Bool": {"aws:MultiFactorAuthPresent": false}}}}"#,
        )
        .unwrap();
        assert!(lint_policy(&doc).is_empty());
    }

    #[test]
    fn test_reports_missing_and_conflicting_action_forms() {
        let doc = PolicyDocument::from_json(
            r#"{"Version": "2012-10-17", "Statement": [
                {"Effect": "Allow", "Resource": "*"},
                {"Effect": "Deny", "Action": "s3:*", "NotAction": "s3:Get*", "Resource": "*"},
                {"Effect": "Deny", "NotAction": "Bad", "Resource": "*"}
            ]}"#,
        )
        .unwrap();
        let issues: Vec<String> = lint_policy(&doc).iter().map(ToString::to_string).collect();
        assert_eq!(
            issues,
            vec![
                "Statement[0]: Action or NotAction must not be empty",
                "Statement[1]: Action and NotAction must not both be set",
                "Statement[2]: action 'Bad' is not of the form service:Action",
            ]
        );
    }
}
