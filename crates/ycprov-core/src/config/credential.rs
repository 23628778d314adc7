//! Credential resolution with optional keyring support
//!
//! Values can be given in plaintext, as a `keyring:<key>` reference (with the
//! `secure-storage` feature), or overridden by an environment variable.

use super::error::{ConfigError, Result};
use std::env;

/// Environment variable holding the IAM token
pub const IAM_TOKEN_ENV: &str = "IAM_TOKEN";

/// Prefix that indicates a value should be retrieved from the keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "ycprov";

/// Resolve a credential value
///
/// Resolution order:
/// 1. Check environment variable (if env_var provided and set to a non-empty value)
/// 2. If value starts with "keyring:", retrieve from keyring
/// 3. Otherwise, return the value as-is (plaintext)
pub fn resolve_credential(value: Option<&str>, env_var: Option<&str>) -> Result<Option<String>> {
    if let Some(var) = env_var
        && let Ok(env_value) = env::var(var)
        && !env_value.is_empty()
    {
        return Ok(Some(env_value));
    }

    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Some(key) = value.strip_prefix(KEYRING_PREFIX) {
        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, key)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            entry.get_password().map(Some).map_err(|e| {
                ConfigError::KeyringError(format!(
                    "Failed to retrieve credential '{}' from keyring: {}",
                    key, e
                ))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "Credential '{}' references keyring but secure-storage feature is not enabled",
                key
            )))
        }
    } else {
        Ok(Some(value.to_string()))
    }
}

/// Check if a value is a keyring reference
pub fn is_keyring_reference(value: &str) -> bool {
    value.starts_with(KEYRING_PREFIX)
}
