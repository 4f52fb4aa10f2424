//! Local validation of user identities and policy documents (pure Rust)

pub mod identity;
pub mod policy;

pub use identity::{validate_path, validate_user_name};
pub use policy::{lint_policy, PolicyIssue};
