//! Access key material.

use crate::error::{ProvisionerError, ProvisionerResult};
use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

const ACCESS_KEY_ID_PREFIX: &str = "AKIA";
const ACCESS_KEY_ID_BODY_LEN: usize = 16;
const SECRET_LEN: usize = 40;
const KEY_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKeyStatus {
    Active,
    Inactive,
}

/// A credential pair bound to one user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub status: AccessKeyStatus,
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKey")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

/// Generate an AWS-shaped credential pair locally. Used by the in-memory
/// backend; real keys come from IAM.
pub(crate) fn generate_access_key() -> ProvisionerResult<AccessKey> {
    let rng = SystemRandom::new();

    let mut id_bytes = [0u8; ACCESS_KEY_ID_BODY_LEN];
    rng.fill(&mut id_bytes)
        .map_err(|_| ProvisionerError::backend("GenerateAccessKey", "random source failed"))?;
    let id_body: String = id_bytes
        .iter()
        .map(|b| char::from(KEY_ID_ALPHABET[usize::from(*b) % KEY_ID_ALPHABET.len()]))
        .collect();

    // 30 random bytes encode to exactly 40 base64 characters.
    let mut secret_bytes = [0u8; SECRET_LEN / 4 * 3];
    rng.fill(&mut secret_bytes)
        .map_err(|_| ProvisionerError::backend("GenerateAccessKey", "random source failed"))?;

    Ok(AccessKey {
        access_key_id: format!("{ACCESS_KEY_ID_PREFIX}{id_body}"),
        secret_access_key: STANDARD.encode(secret_bytes),
        status: AccessKeyStatus::Active,
    })
}
