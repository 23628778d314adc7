//! Input validation for command arguments

use crate::error::{CliError, CliResult};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

const MAX_ID_LENGTH: usize = 32;
const MAX_USERS_PER_BATCH: u32 = 100;
const MAX_BATCH_SIZE: u32 = 32;

static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static regex is valid"));

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("static regex is valid")
});

fn validate_id(kind: &str, value: &str) -> CliResult<()> {
    if value.is_empty() {
        return Err(CliError::invalid(format!("{} cannot be empty", kind)));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(CliError::invalid(format!(
            "{} cannot be longer than {} characters",
            kind, MAX_ID_LENGTH
        )));
    }
    if !ALPHANUMERIC.is_match(value) {
        return Err(CliError::invalid(format!(
            "{} must contain only letters and digits",
            kind
        )));
    }
    Ok(())
}

pub fn validate_userpool_id(userpool_id: &str) -> CliResult<()> {
    validate_id("User pool ID", userpool_id)
}

pub fn validate_cloud_id(cloud_id: &str) -> CliResult<()> {
    validate_id("Cloud ID", cloud_id)
}

pub fn validate_number_of_users(num_users: u32) -> CliResult<()> {
    if num_users == 0 {
        return Err(CliError::invalid("Number of users must be greater than zero"));
    }
    if num_users > MAX_USERS_PER_BATCH {
        return Err(CliError::invalid(format!(
            "Number of users cannot be greater than {}",
            MAX_USERS_PER_BATCH
        )));
    }
    Ok(())
}

pub fn validate_domain(domain: &str) -> CliResult<()> {
    if domain.is_empty() {
        return Err(CliError::invalid("Domain name cannot be empty"));
    }
    if !DOMAIN.is_match(domain) {
        return Err(CliError::invalid(format!(
            "Invalid domain name syntax: {}",
            domain
        )));
    }
    Ok(())
}

pub fn validate_batch_size(batch_size: u32) -> CliResult<()> {
    if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
        return Err(CliError::invalid(format!(
            "Batch size must be between 1 and {}",
            MAX_BATCH_SIZE
        )));
    }
    Ok(())
}

pub fn validate_output_dir(path: &Path) -> CliResult<()> {
    if !path.is_dir() {
        return Err(CliError::invalid(format!(
            "Output directory {} is not a directory",
            path.display()
        )));
    }
    let readonly = path
        .metadata()
        .map(|m| m.permissions().readonly())
        .map_err(|e| CliError::file(path, e))?;
    if readonly {
        return Err(CliError::invalid(format!(
            "Output directory {} is not writable",
            path.display()
        )));
    }
    Ok(())
}

/// The output file's directory must exist; an existing file is overwritten.
pub fn validate_output_file(path: &Path) -> CliResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !dir.is_dir() {
        return Err(CliError::invalid(format!(
            "Directory {} does not exist",
            dir.display()
        )));
    }
    if path.exists() {
        warn!(
            "Output file {} already exists and will be overwritten",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids() {
        assert!(validate_userpool_id("ek0abc123").is_ok());
        assert!(validate_userpool_id("").is_err());
        assert!(validate_userpool_id("with-dash").is_err());
        assert!(validate_cloud_id(&"a".repeat(32)).is_ok());
        assert!(validate_cloud_id(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_number_of_users_bounds() {
        assert!(validate_number_of_users(0).is_err());
        assert!(validate_number_of_users(1).is_ok());
        assert!(validate_number_of_users(100).is_ok());
        assert!(validate_number_of_users(101).is_err());
    }

    #[test]
    fn test_domain() {
        assert!(validate_domain("ydbem.idp.yandexcloud.net").is_ok());
        assert!(validate_domain("localhost").is_ok());
        assert!(validate_domain("-bad.example").is_err());
        assert!(validate_domain("bad..example").is_err());
        assert!(validate_domain("").is_err());
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(validate_batch_size(0).is_err());
        assert!(validate_batch_size(1).is_ok());
        assert!(validate_batch_size(32).is_ok());
        assert!(validate_batch_size(33).is_err());
    }

    #[test]
    fn test_output_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(validate_output_dir(dir.path()).is_ok());
        assert!(validate_output_dir(&dir.path().join("missing")).is_err());

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(validate_output_dir(&file).is_err());
    }

    #[test]
    fn test_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(validate_output_file(&dir.path().join("users.csv")).is_ok());
        assert!(validate_output_file(Path::new("users.csv")).is_ok());
        assert!(validate_output_file(&dir.path().join("missing").join("users.csv")).is_err());
    }
}
