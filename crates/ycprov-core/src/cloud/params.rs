//! Request payloads and resource models for the control-plane APIs
//!
//! Field names follow the REST APIs' camelCase JSON. Resource models keep only
//! the fields the workflows read; everything else is ignored on deserialize.

use crate::config::ProvisioningConfig;
use crate::error::{CoreError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static DATABASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]([-_a-zA-Z0-9]{0,61}[a-zA-Z0-9])?$").expect("static regex is valid")
});

/// Returns true if `name` is acceptable as a YDB database name
pub fn is_valid_database_name(name: &str) -> bool {
    DATABASE_NAME.is_match(name)
}

/// Password plus the proof that the service generated it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSpec {
    pub password: String,
    pub generation_proof: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub userpool_id: String,
    pub username: String,
    pub full_name: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_spec: PasswordSpec,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    pub password_spec: PasswordSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub cloud_id: String,
    pub name: String,
    pub description: String,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Subject {
    pub fn user_account(user_id: impl Into<String>) -> Self {
        Self {
            id: user_id.into(),
            kind: "userAccount".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessBinding {
    pub role_id: String,
    pub subject: Subject,
}

/// Replaces a resource's access bindings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAccessBindingsRequest {
    pub access_bindings: Vec<AccessBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindingAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessBindingDelta {
    pub action: BindingAction,
    pub access_binding: AccessBinding,
}

/// Adds or removes individual access bindings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccessBindingsRequest {
    pub access_binding_deltas: Vec<AccessBindingDelta>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNetworkRequest {
    pub folder_id: String,
    pub name: String,
    pub description: String,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetRequest {
    pub folder_id: String,
    pub name: String,
    pub description: String,
    pub labels: HashMap<String, String>,
    pub network_id: String,
    pub zone_id: String,
    pub v4_cidr_blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOption {
    #[serde(default)]
    pub storage_type_id: String,
    /// Int64, sent as a JSON string but accepted as a number too
    #[serde(default, deserialize_with = "string_or_number")]
    pub group_count: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::String(s)) => s,
        Some(StringOrNumber::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

impl StorageOption {
    /// Group count as a number; unparsable values count as zero
    pub fn groups(&self) -> u64 {
        self.group_count.parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default)]
    pub storage_options: Vec<StorageOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedScale {
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalePolicy {
    pub fixed_scale: FixedScale,
}

/// Compute and storage layout of a dedicated database
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedicatedDatabase {
    pub resource_preset_id: String,
    pub storage_config: StorageConfig,
    pub scale_policy: ScalePolicy,
    pub network_id: String,
    pub subnet_ids: Vec<String>,
    pub assign_public_ips: bool,
}

/// Create request for a dedicated YDB database.
///
/// The layout is sent both at the top level and under `dedicatedDatabase`;
/// the API accepts either shape depending on version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseRequest {
    pub folder_id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub layout: DedicatedDatabase,
    pub dedicated_database: DedicatedDatabase,
    pub labels: HashMap<String, String>,
}

impl CreateDatabaseRequest {
    /// Build a dedicated database request, validating the name first
    pub fn dedicated(
        folder_id: &str,
        name: &str,
        description: &str,
        network_id: &str,
        subnet_ids: &[String],
        provisioning: &ProvisioningConfig,
    ) -> Result<Self> {
        if !is_valid_database_name(name) {
            return Err(CoreError::Validation(format!(
                "Invalid database name '{}': must start with a letter, end with a letter or digit \
                 and contain at most 63 letters, digits, '-' or '_'",
                name
            )));
        }

        let layout = DedicatedDatabase {
            resource_preset_id: provisioning.resource_preset.clone(),
            storage_config: StorageConfig {
                storage_options: vec![StorageOption {
                    storage_type_id: provisioning.storage_type.clone(),
                    group_count: provisioning.group_count.clone(),
                }],
            },
            scale_policy: ScalePolicy {
                fixed_scale: FixedScale {
                    size: provisioning.scale_size.clone(),
                },
            },
            network_id: network_id.to_string(),
            subnet_ids: subnet_ids.to_vec(),
            assign_public_ips: false,
        };

        Ok(Self {
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            layout: layout.clone(),
            dedicated_database: layout,
            labels: HashMap::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Folder {
    /// Folder known only by id; the id doubles as its name
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub zone_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub storage_config: StorageConfig,
}

impl Database {
    fn max_group_count(&self) -> u64 {
        self.storage_config
            .storage_options
            .iter()
            .map(StorageOption::groups)
            .max()
            .unwrap_or(0)
    }
}

/// True if any database has a storage option with more than one group
pub fn has_dedicated_storage(databases: &[Database]) -> bool {
    databases.iter().any(|db| db.max_group_count() > 1)
}

/// First database with at least one storage group
pub fn first_with_storage_groups(databases: &[Database]) -> Option<&Database> {
    databases.iter().find(|db| db.max_group_count() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_name_validation() {
        assert!(is_valid_database_name("ydb-alice"));
        assert!(is_valid_database_name("a"));
        assert!(is_valid_database_name(&format!("a{}", "b".repeat(62))));
        assert!(!is_valid_database_name(&format!("a{}", "b".repeat(63))));
        assert!(!is_valid_database_name("1db"));
        assert!(!is_valid_database_name("ydb-"));
        assert!(!is_valid_database_name("ydb.alice"));
        assert!(!is_valid_database_name(""));
    }

    #[test]
    fn test_dedicated_payload_shape() {
        let request = CreateDatabaseRequest::dedicated(
            "folder-1",
            "ydb-alice",
            "YDB database for folder alice",
            "net-1",
            &["s-a".to_string(), "s-b".to_string()],
            &ProvisioningConfig::default(),
        )
        .unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["folderId"], "folder-1");
        assert_eq!(body["resourcePresetId"], "small-m8");
        assert_eq!(body["assignPublicIps"], false);
        assert_eq!(
            body["dedicatedDatabase"]["storageConfig"]["storageOptions"][0],
            json!({"storageTypeId": "ssd", "groupCount": "1"})
        );
        assert_eq!(body["dedicatedDatabase"]["scalePolicy"], json!({"fixedScale": {"size": "1"}}));
        assert_eq!(body["subnetIds"], json!(["s-a", "s-b"]));
        assert_eq!(body["labels"], json!({}));
    }

    #[test]
    fn test_invalid_name_rejected_before_request() {
        let err = CreateDatabaseRequest::dedicated(
            "folder-1",
            "ydb-alice.",
            "",
            "net-1",
            &[],
            &ProvisioningConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_cloud_binding_delta_serialization() {
        let request = UpdateAccessBindingsRequest {
            access_binding_deltas: vec![AccessBindingDelta {
                action: BindingAction::Add,
                access_binding: AccessBinding {
                    role_id: "resource-manager.clouds.member".to_string(),
                    subject: Subject::user_account("user-1"),
                },
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "accessBindingDeltas": [{
                    "action": "ADD",
                    "accessBinding": {
                        "roleId": "resource-manager.clouds.member",
                        "subject": {"id": "user-1", "type": "userAccount"}
                    }
                }]
            })
        );
    }

    fn database(id: &str, group_counts: &[&str]) -> Database {
        serde_json::from_value(json!({
            "id": id,
            "storageConfig": {
                "storageOptions": group_counts
                    .iter()
                    .map(|c| json!({"storageTypeId": "ssd", "groupCount": c}))
                    .collect::<Vec<_>>()
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_dedicated_storage_needs_more_than_one_group() {
        assert!(!has_dedicated_storage(&[database("db-1", &["1"])]));
        assert!(has_dedicated_storage(&[
            database("db-1", &["1"]),
            database("db-2", &["0", "3"])
        ]));
        assert!(!has_dedicated_storage(&[database("db-1", &["many"])]));
        assert!(!has_dedicated_storage(&[]));
    }

    #[test]
    fn test_group_count_accepts_numbers() {
        let db: Database = serde_json::from_value(json!({
            "id": "db-1",
            "storageConfig": {
                "storageOptions": [
                    {"storageTypeId": "ssd", "groupCount": 2},
                    {"storageTypeId": "hdd", "groupCount": null}
                ]
            }
        }))
        .unwrap();

        assert_eq!(db.storage_config.storage_options[0].groups(), 2);
        assert_eq!(db.storage_config.storage_options[1].groups(), 0);
        assert!(has_dedicated_storage(std::slice::from_ref(&db)));
        assert_eq!(
            first_with_storage_groups(std::slice::from_ref(&db)).map(|d| d.id.as_str()),
            Some("db-1")
        );
    }

    #[test]
    fn test_storage_groups_detection() {
        let serverless: Database = serde_json::from_value(json!({"id": "db-0"})).unwrap();
        assert!(first_with_storage_groups(std::slice::from_ref(&serverless)).is_none());

        let dbs = vec![serverless, database("db-1", &["0"]), database("db-2", &["1"])];
        assert_eq!(first_with_storage_groups(&dbs).map(|d| d.id.as_str()), Some("db-2"));
    }
}
