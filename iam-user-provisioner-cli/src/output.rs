//! Human-readable summaries, written to stderr so stdout stays machine-readable.

use colored::Colorize;
use iam_user_provisioner_core::{
    DestroyReport, Effect, PolicyDocument, PolicyIssue, ProvisionPlan, ProvisionedUser,
    VerifyReport,
};

pub fn print_plan(plan: &ProvisionPlan) {
    eprintln!("{}", "Provisioning plan".bold());
    eprintln!("  User:          {}", plan.user.name.cyan());
    eprintln!("  Path:          {}", plan.user.path);
    eprintln!("  Force destroy: {}", plan.user.force_destroy);
    eprintln!("  Role:          {}", plan.role.to_string().cyan());
    eprintln!("  Policy name:   {}", plan.policy_name);
    if plan.fell_back {
        eprintln!(
            "  {} neither devuser nor qauser was set; the QA policy will be attached",
            "Note:".yellow().bold()
        );
    }
    print_statements(&plan.policy);
}

fn print_statements(policy: &PolicyDocument) {
    for stmt in &policy.statement {
        let effect = match stmt.effect {
            Effect::Allow => "Allow".green(),
            Effect::Deny => "Deny".red(),
        };
        let actions = if stmt.not_action.is_empty() {
            format!("{} action(s)", stmt.action.len())
        } else {
            format!("all but {} action(s)", stmt.not_action.len())
        };
        let resources = if stmt.not_resource.is_empty() {
            stmt.resource.join(", ")
        } else {
            format!("all but {}", stmt.not_resource.join(", "))
        };
        eprintln!(
            "  {} {} on {}{}",
            effect,
            actions,
            resources,
            if stmt.has_condition() {
                " (conditional)"
            } else {
                ""
            }
        );
    }
}

pub fn print_provisioned(user: &ProvisionedUser) {
    eprintln!("{} {}", "Created".green().bold(), user.arn);
    eprintln!("  Access key id: {}", user.access_key.access_key_id);
    eprintln!("  Inline policy: {}", user.attached_policy_name);
    eprintln!(
        "  {} the secret access key is printed once on stdout; store it now",
        "Warning:".yellow().bold()
    );
}

pub fn print_destroyed(report: &DestroyReport) {
    eprintln!("{} {}", "Destroyed".red().bold(), report.user);
    for policy in &report.deleted_policies {
        eprintln!("  - inline policy {policy}");
    }
    for key in &report.deleted_access_keys {
        eprintln!("  - access key {key}");
    }
}

pub fn print_verify(report: &VerifyReport) {
    if report.is_in_sync() {
        eprintln!(
            "{} '{}' on {} matches the plan",
            "In sync:".green().bold(),
            report.policy_name,
            report.user
        );
    } else if !report.user_exists {
        eprintln!("{} user {} does not exist", "Drift:".red().bold(), report.user);
    } else if report.actual_policy.is_none() {
        eprintln!(
            "{} inline policy '{}' is missing from {}",
            "Drift:".red().bold(),
            report.policy_name,
            report.user
        );
    } else {
        eprintln!(
            "{} inline policy '{}' on {} differs from the plan",
            "Drift:".red().bold(),
            report.policy_name,
            report.user
        );
    }
}

pub fn print_issues(issues: &[PolicyIssue]) {
    eprintln!("{} {} issue(s) found", "Invalid policy:".red().bold(), issues.len());
    for issue in issues {
        eprintln!("  - {issue}");
    }
}
