//! Start-and-wait workflows built on the single-operation waiter
//!
//! Each function launches one control-plane operation and blocks until it is
//! terminal, returning the id of whatever the operation created.

use crate::config::ProvisioningConfig;
use crate::error::{CoreError, Result};
use crate::operation::OperationHandle;
use crate::progress::{WaitOptions, wait_for_operation};
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

use super::client::CloudClient;
use super::params::{
    AccessBinding, CreateSubnetRequest, CreateUserRequest, Network, PasswordSpec, Subject, Subnet,
};

/// A network plus the subnets a database can be placed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vpc {
    pub network_id: String,
    pub subnet_ids: Vec<String>,
    /// False when an existing network was reused
    pub created: bool,
}

async fn wait(client: &CloudClient, handle: &OperationHandle, options: &WaitOptions) -> Result<Value> {
    wait_for_operation(
        client,
        handle.operation_id(),
        handle.description(),
        options,
        None,
    )
    .await
}

fn created_id(response: &Value, handle: &OperationHandle) -> Result<String> {
    response
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CoreError::MissingField {
            context: format!("Response of {}", handle.description()),
            field: "id".to_string(),
        })
}

/// Create a user and return its id
pub async fn create_user_and_wait(
    client: &CloudClient,
    request: &CreateUserRequest,
    options: &WaitOptions,
) -> Result<String> {
    let handle = client.start_user_creation(request).await?;
    let response = wait(client, &handle, options).await?;
    let user_id = created_id(&response, &handle)?;
    info!("User created: {} (ID: {})", request.username, user_id);
    Ok(user_id)
}

/// Create a folder and return its id
pub async fn create_folder_and_wait(
    client: &CloudClient,
    cloud_id: &str,
    name: &str,
    description: Option<&str>,
    options: &WaitOptions,
) -> Result<String> {
    let handle = client
        .start_folder_creation(cloud_id, name, description)
        .await?;
    let response = wait(client, &handle, options).await?;
    let folder_id = created_id(&response, &handle)?;
    info!("Folder created successfully: {} (ID: {})", name, folder_id);
    Ok(folder_id)
}

pub async fn grant_folder_access_and_wait(
    client: &CloudClient,
    folder_id: &str,
    user_id: &str,
    role_id: &str,
    options: &WaitOptions,
) -> Result<()> {
    let binding = AccessBinding {
        role_id: role_id.to_string(),
        subject: Subject::user_account(user_id),
    };
    let handle = client.start_folder_access_binding(folder_id, binding).await?;
    wait(client, &handle, options).await?;
    info!(
        "Access granted successfully: user {} -> role {} -> folder {}",
        user_id, role_id, folder_id
    );
    Ok(())
}

pub async fn grant_cloud_access_and_wait(
    client: &CloudClient,
    cloud_id: &str,
    user_id: &str,
    role_id: &str,
    options: &WaitOptions,
) -> Result<()> {
    let binding = AccessBinding {
        role_id: role_id.to_string(),
        subject: Subject::user_account(user_id),
    };
    let handle = client.start_cloud_access_binding(cloud_id, binding).await?;
    wait(client, &handle, options).await?;
    info!(
        "Cloud access granted successfully: user {} -> role {} -> cloud {}",
        user_id, role_id, cloud_id
    );
    Ok(())
}

/// Generate a fresh password, set it for `user_id` and return it
pub async fn reset_password_and_wait(
    client: &CloudClient,
    user_id: &str,
    options: &WaitOptions,
) -> Result<PasswordSpec> {
    let password = client.generate_password().await?;
    let handle = client.start_password_reset(user_id, &password).await?;
    wait(client, &handle, options).await?;
    info!("Password reset completed for user {}", user_id);
    Ok(password)
}

/// First network whose subnets cover every zone in `zones`
pub fn find_complete_vpc(candidates: &[(Network, Vec<Subnet>)], zones: &[String]) -> Option<Vpc> {
    candidates.iter().find_map(|(network, subnets)| {
        let covered: HashSet<&str> = subnets.iter().map(|s| s.zone_id.as_str()).collect();
        let missing: Vec<&str> = zones
            .iter()
            .map(String::as_str)
            .filter(|z| !covered.contains(z))
            .collect();

        if subnets.is_empty() || !missing.is_empty() {
            info!(
                "Network {} (ID: {}) missing subnets in zones: {:?}",
                network.name, network.id, missing
            );
            return None;
        }

        Some(Vpc {
            network_id: network.id.clone(),
            subnet_ids: subnets.iter().map(|s| s.id.clone()).collect(),
            created: false,
        })
    })
}

/// Reuse a network covering every configured zone, or create one with a
/// subnet per zone
pub async fn ensure_vpc(
    client: &CloudClient,
    folder_id: &str,
    folder_name: &str,
    provisioning: &ProvisioningConfig,
    options: &WaitOptions,
) -> Result<Vpc> {
    let zone_subnets = provisioning.zone_subnets()?;

    let mut candidates = Vec::new();
    for network in client.list_networks(folder_id).await? {
        let subnets = client.list_subnets(&network.id).await?;
        candidates.push((network, subnets));
    }

    if let Some(vpc) = find_complete_vpc(&candidates, &provisioning.zones) {
        info!(
            "Using existing VPC {} for folder {} (ID: {})",
            vpc.network_id, folder_name, folder_id
        );
        return Ok(vpc);
    }

    info!("Creating new VPC for folder {} (ID: {})", folder_name, folder_id);
    let network_name = format!("vpc-{}", folder_name);
    let handle = client
        .start_network_creation(
            folder_id,
            &network_name,
            &format!("VPC network for folder {}", folder_name),
        )
        .await?;
    let response = wait(client, &handle, options).await?;
    let network_id = created_id(&response, &handle)?;

    let mut subnet_ids = Vec::with_capacity(zone_subnets.len());
    for (zone, cidr_block) in zone_subnets {
        let request = CreateSubnetRequest {
            folder_id: folder_id.to_string(),
            name: format!("{}-subnet-{}", network_name, zone),
            description: format!("Subnet in {} for {}", zone, network_name),
            labels: Default::default(),
            network_id: network_id.clone(),
            zone_id: zone,
            v4_cidr_blocks: vec![cidr_block],
        };
        let handle = client.start_subnet_creation(&request).await?;
        let response = wait(client, &handle, options).await?;
        subnet_ids.push(created_id(&response, &handle)?);
    }

    info!(
        "VPC network created successfully: {} (ID: {}) with subnets: {:?}",
        network_name, network_id, subnet_ids
    );
    Ok(Vpc {
        network_id,
        subnet_ids,
        created: true,
    })
}
