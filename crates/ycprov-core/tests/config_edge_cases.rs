use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;
use ycprov_core::config::{Config, ConfigError, PollingConfig};

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Missing and empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/ycprov-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file should yield defaults");

    assert_eq!(config, Config::default());
    assert_eq!(config.polling.max_concurrent_operations, 15);
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load_from_path(&config_path).expect("empty file should parse as default");

    assert_eq!(config, Config::default());
}

// ---------------------------------------------------------------------------
// Corrupt and mistyped content
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[[[broken").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)), "got {err}");
}

#[test]
fn load_wrong_type_in_polling_section_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[polling]\nmax_concurrent_operations = \"lots\"\n",
    )
    .unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

// ---------------------------------------------------------------------------
// Partial sections
// ---------------------------------------------------------------------------

#[test]
fn partial_sections_keep_remaining_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
cloud_id = "b1gcloud"

[polling]
max_concurrent_operations = 5
wait_timeout_secs = 600

[endpoints]
ydb = "http://127.0.0.1:9000/ydb/v1"

[provisioning]
resource_preset = "medium-m64"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.cloud_id.as_deref(), Some("b1gcloud"));
    assert_eq!(
        config.polling,
        PollingConfig {
            max_concurrent_operations: 5,
            wait_timeout_secs: 600,
            ..PollingConfig::default()
        }
    );
    assert_eq!(config.endpoints.ydb, "http://127.0.0.1:9000/ydb/v1");
    assert_eq!(
        config.endpoints.vpc,
        "https://vpc.api.cloud.yandex.net/vpc/v1"
    );
    assert_eq!(config.provisioning.resource_preset, "medium-m64");
    assert_eq!(config.provisioning.zones.len(), 3);
}

// ---------------------------------------------------------------------------
// Environment expansion
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn env_references_expand_on_load() {
    unsafe {
        std::env::set_var("YCPROV_EDGE_TOKEN", "t1.expanded");
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "iam_token = \"${YCPROV_EDGE_TOKEN}\"\ndomain = \"${YCPROV_EDGE_UNSET}\"\n",
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.iam_token.as_deref(), Some("t1.expanded"));
    assert_eq!(config.domain.as_deref(), Some("${YCPROV_EDGE_UNSET}"));

    unsafe {
        std::env::remove_var("YCPROV_EDGE_TOKEN");
    }
}

// ---------------------------------------------------------------------------
// Save round trip
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directories_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("deeper").join("config.toml");

    let mut config = Config::default();
    config.domain = Some("example.org".to_string());
    config.polling.sweep_pacing_secs = 5;
    config.save_to_path(&config_path).unwrap();

    let loaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(loaded, config);
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn unreadable_config_file_returns_load_error() {
    use std::os::unix::fs::PermissionsExt;

    // Skip if running as root (permissions won't be enforced)
    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# valid toml").unwrap();
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError { .. }), "got {err}");

    // Restore permissions so TempDir cleanup can remove the file
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();
}
