//! IAM user name and path rules.

use crate::error::{ProvisionerError, ProvisionerResult};

const MAX_USER_NAME_LEN: usize = 64;
const MAX_PATH_LEN: usize = 512;

fn is_user_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_+=,.@-".contains(c)
}

/// Check a user name against the IAM naming rules.
pub fn validate_user_name(name: &str) -> ProvisionerResult<()> {
    let invalid = |reason: &str| ProvisionerError::InvalidUserName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.chars().count() > MAX_USER_NAME_LEN {
        return Err(invalid("name must be at most 64 characters"));
    }
    if !name.chars().all(is_user_name_char) {
        return Err(invalid(
            "only alphanumerics and the characters +=,.@_- are allowed",
        ));
    }
    Ok(())
}

/// Check an IAM path: `/` alone, or `/.../` of printable ASCII. IAM accepts
/// empty segments such as `/a//b/`.
pub fn validate_path(path: &str) -> ProvisionerResult<()> {
    let invalid = |reason: &str| ProvisionerError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.len() > MAX_PATH_LEN {
        return Err(invalid("path must be at most 512 characters"));
    }
    if !path.starts_with('/') || !path.ends_with('/') {
        return Err(invalid("path must begin and end with '/'"));
    }
    if let Some(c) = path.chars().find(|c| !('\u{21}'..='\u{7E}').contains(c)) {
        return Err(invalid(&format!("character {c:?} is not allowed")));
    }
    Ok(())
}
