//! HTTP client for the control-plane REST APIs
//!
//! Start calls return an [`OperationHandle`] for the operation they launched;
//! list calls follow `nextPageToken` until exhausted. The client also serves
//! operation status reads for the polling layer via [`OperationApi`].

use crate::config::Endpoints;
use crate::error::{CoreError, Result, TransportError};
use crate::fetcher::OperationApi;
use crate::operation::{Operation, OperationHandle, OperationStatus};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use super::params::{
    AccessBinding, AccessBindingDelta, BindingAction, CreateDatabaseRequest, CreateFolderRequest,
    CreateNetworkRequest, CreateSubnetRequest, CreateUserRequest, Database, Folder, Network,
    PasswordSpec, SetAccessBindingsRequest, SetPasswordRequest, Subnet,
    UpdateAccessBindingsRequest, User,
};

const PAGE_SIZE: u32 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated client for the organization-manager, resource-manager, VPC,
/// YDB and operation services
#[derive(Clone)]
pub struct CloudClient {
    http: Client,
    token: String,
    endpoints: Endpoints,
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("token", &"***")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl CloudClient {
    pub fn new(token: impl Into<String>, endpoints: Endpoints) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ycprov/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            token: token.into(),
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // -- identity ----------------------------------------------------------

    /// Ask the service for a password that satisfies the pool's policy
    pub async fn generate_password(&self) -> Result<PasswordSpec> {
        let context = "Password generation";
        let url = format!(
            "{}/idp/users:generatePassword",
            self.endpoints.organization_manager
        );
        let data = self.send(self.http.post(&url), context).await?;
        let spec = field::<PasswordSpec>(&data, "passwordSpec", context)?;
        info!("Password generated successfully");
        Ok(spec)
    }

    pub async fn start_user_creation(&self, request: &CreateUserRequest) -> Result<OperationHandle> {
        let context = format!("User creation for {}", request.username);
        let url = format!("{}/idp/users", self.endpoints.organization_manager);
        let data = self
            .send(self.http.post(&url).json(request), &context)
            .await?;
        operation_handle(&data, &context, format!("user creation for {}", request.username))
    }

    /// Set a new password for another user, as an administrator
    pub async fn start_password_reset(
        &self,
        user_id: &str,
        password: &PasswordSpec,
    ) -> Result<OperationHandle> {
        let context = format!("Password reset for user {}", user_id);
        let url = format!(
            "{}/idp/users/{}:setOthersPassword",
            self.endpoints.organization_manager, user_id
        );
        let body = SetPasswordRequest {
            password_spec: password.clone(),
        };
        let data = self.send(self.http.post(&url).json(&body), &context).await?;
        operation_handle(&data, &context, format!("password reset for user {}", user_id))
    }

    pub async fn list_users(&self, userpool_id: &str) -> Result<Vec<User>> {
        let url = format!("{}/idp/users", self.endpoints.organization_manager);
        let users: Vec<User> = self
            .list_all(
                &url,
                &[("userpoolId", userpool_id)],
                "users",
                &format!("List users in userpool {}", userpool_id),
            )
            .await?;
        info!("Listed {} users in userpool {}", users.len(), userpool_id);
        Ok(users)
    }

    // -- resource manager --------------------------------------------------

    pub async fn start_folder_creation(
        &self,
        cloud_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<OperationHandle> {
        let context = format!("Folder creation for {}", name);
        let url = format!("{}/folders", self.endpoints.resource_manager);
        let body = CreateFolderRequest {
            cloud_id: cloud_id.to_string(),
            name: name.to_string(),
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| format!("Personal folder for user {}", name)),
            labels: Default::default(),
        };
        let data = self.send(self.http.post(&url).json(&body), &context).await?;
        operation_handle(&data, &context, format!("folder creation for {}", name))
    }

    pub async fn list_folders(&self, cloud_id: &str) -> Result<Vec<Folder>> {
        let url = format!("{}/folders", self.endpoints.resource_manager);
        let folders: Vec<Folder> = self
            .list_all(
                &url,
                &[("cloudId", cloud_id)],
                "folders",
                &format!("List folders in cloud {}", cloud_id),
            )
            .await?;
        info!("Found {} folders in cloud {}", folders.len(), cloud_id);
        Ok(folders)
    }

    /// Replace the folder's access bindings with `binding`
    pub async fn start_folder_access_binding(
        &self,
        folder_id: &str,
        binding: AccessBinding,
    ) -> Result<OperationHandle> {
        let context = format!(
            "Access grant for {} to folder {}",
            binding.subject.id, folder_id
        );
        let url = format!(
            "{}/folders/{}:setAccessBindings",
            self.endpoints.resource_manager, folder_id
        );
        let description = format!(
            "folder access grant for {} ({}) on {}",
            binding.subject.id, binding.role_id, folder_id
        );
        let body = SetAccessBindingsRequest {
            access_bindings: vec![binding],
        };
        let data = self.send(self.http.post(&url).json(&body), &context).await?;
        operation_handle(&data, &context, description)
    }

    /// Add `binding` to the cloud's existing access bindings
    pub async fn start_cloud_access_binding(
        &self,
        cloud_id: &str,
        binding: AccessBinding,
    ) -> Result<OperationHandle> {
        let context = format!(
            "Cloud access grant for {} to cloud {}",
            binding.subject.id, cloud_id
        );
        let url = format!(
            "{}/clouds/{}:updateAccessBindings",
            self.endpoints.resource_manager, cloud_id
        );
        let description = format!(
            "cloud access grant for user {} to cloud {}",
            binding.subject.id, cloud_id
        );
        let body = UpdateAccessBindingsRequest {
            access_binding_deltas: vec![AccessBindingDelta {
                action: BindingAction::Add,
                access_binding: binding,
            }],
        };
        let data = self.send(self.http.post(&url).json(&body), &context).await?;
        operation_handle(&data, &context, description)
    }

    // -- vpc ---------------------------------------------------------------

    pub async fn start_network_creation(
        &self,
        folder_id: &str,
        name: &str,
        description: &str,
    ) -> Result<OperationHandle> {
        let context = format!("Network creation for {}", name);
        let url = format!("{}/networks", self.endpoints.vpc);
        let body = CreateNetworkRequest {
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            labels: Default::default(),
        };
        let data = self.send(self.http.post(&url).json(&body), &context).await?;
        operation_handle(&data, &context, format!("network creation for {}", name))
    }

    pub async fn start_subnet_creation(
        &self,
        request: &CreateSubnetRequest,
    ) -> Result<OperationHandle> {
        let context = format!("Subnet creation for {}", request.name);
        let url = format!("{}/subnets", self.endpoints.vpc);
        let data = self
            .send(self.http.post(&url).json(request), &context)
            .await?;
        operation_handle(
            &data,
            &context,
            format!("subnet creation for {} in {}", request.name, request.zone_id),
        )
    }

    pub async fn list_networks(&self, folder_id: &str) -> Result<Vec<Network>> {
        let url = format!("{}/networks", self.endpoints.vpc);
        let networks: Vec<Network> = self
            .list_all(
                &url,
                &[("folderId", folder_id)],
                "networks",
                &format!("List networks in folder {}", folder_id),
            )
            .await?;
        info!("Found {} networks in folder {}", networks.len(), folder_id);
        Ok(networks)
    }

    pub async fn list_subnets(&self, network_id: &str) -> Result<Vec<Subnet>> {
        let url = format!("{}/networks/{}/subnets", self.endpoints.vpc, network_id);
        let subnets: Vec<Subnet> = self
            .list_all(
                &url,
                &[],
                "subnets",
                &format!("List subnets for network {}", network_id),
            )
            .await?;
        debug!("Found {} subnets in network {}", subnets.len(), network_id);
        Ok(subnets)
    }

    // -- ydb ---------------------------------------------------------------

    pub async fn start_database_creation(
        &self,
        request: &CreateDatabaseRequest,
    ) -> Result<OperationHandle> {
        let context = format!("YDB database creation for {}", request.name);
        let url = format!("{}/databases", self.endpoints.ydb);
        let data = self
            .send(self.http.post(&url).json(request), &context)
            .await?;
        let handle = operation_handle(
            &data,
            &context,
            format!("YDB database creation for {}", request.name),
        )?;
        info!(
            operation_id = %handle.operation_id(),
            "YDB create operation started for {}",
            request.name
        );
        Ok(handle)
    }

    pub async fn start_database_deletion(&self, database_id: &str) -> Result<OperationHandle> {
        let context = format!("YDB database deletion for {}", database_id);
        let url = format!("{}/databases/{}", self.endpoints.ydb, database_id);
        let data = self.send(self.http.delete(&url), &context).await?;
        let handle = operation_handle(
            &data,
            &context,
            format!("YDB database deletion for {}", database_id),
        )?;
        info!(
            operation_id = %handle.operation_id(),
            "YDB delete operation started for database {}",
            database_id
        );
        Ok(handle)
    }

    pub async fn list_databases(&self, folder_id: &str) -> Result<Vec<Database>> {
        let url = format!("{}/databases", self.endpoints.ydb);
        let databases: Vec<Database> = self
            .list_all(
                &url,
                &[("folderId", folder_id)],
                "databases",
                &format!("List YDB databases in folder {}", folder_id),
            )
            .await?;
        info!(
            "Listed {} YDB databases in folder {}",
            databases.len(),
            folder_id
        );
        Ok(databases)
    }

    // -- plumbing ----------------------------------------------------------

    /// Send an authenticated request and decode the JSON body.
    ///
    /// Non-2xx statuses and undecodable bodies become [`CoreError::Request`];
    /// a populated inline `error` object becomes [`CoreError::Rejected`].
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Value> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| request_error(context, e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "{} failed: {}", context, body.trim());
            return Err(request_error(
                context,
                TransportError::with_status(
                    format!("HTTP {}: {}", status, body.trim()),
                    status.as_u16(),
                ),
            ));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| request_error(context, e.into()))?;

        if let Some(status) = inline_error(&data) {
            error!(code = status.code, "{} rejected: {}", context, status);
            return Err(CoreError::Rejected {
                context: context.to_string(),
                code: status.code,
                message: status.message,
            });
        }

        Ok(data)
    }

    async fn list_all<T: DeserializeOwned>(
        &self,
        url: &str,
        filters: &[(&str, &str)],
        key: &str,
        context: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = filters
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect();
            query.push(("pageSize", PAGE_SIZE.to_string()));
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let data = self.send(self.http.get(url).query(&query), context).await?;
            if data.get(key).is_some() {
                items.extend(field::<Vec<T>>(&data, key, context)?);
            }

            match data
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
            {
                Some(token) => page_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl OperationApi for CloudClient {
    async fn get_operation(&self, operation_id: &str) -> std::result::Result<Operation, TransportError> {
        let url = format!("{}/operations/{}", self.endpoints.operation, operation_id);
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::with_status(
                format!("HTTP {}: {}", status, body.trim()),
                status.as_u16(),
            ));
        }

        Ok(response.json::<Operation>().await?)
    }
}

fn request_error(context: &str, source: TransportError) -> CoreError {
    CoreError::Request {
        context: context.to_string(),
        source,
    }
}

fn inline_error(data: &Value) -> Option<OperationStatus> {
    let raw = data.get("error").filter(|e| !e.is_null())?;
    let status = serde_json::from_value::<OperationStatus>(raw.clone()).unwrap_or_else(|_| {
        OperationStatus {
            message: raw.to_string(),
            ..OperationStatus::default()
        }
    });
    (!status.is_empty()).then_some(status)
}

fn field<T: DeserializeOwned>(data: &Value, name: &str, context: &str) -> Result<T> {
    let raw = data.get(name).ok_or_else(|| CoreError::MissingField {
        context: context.to_string(),
        field: name.to_string(),
    })?;
    serde_json::from_value(raw.clone()).map_err(|e| {
        request_error(
            context,
            TransportError::new(format!("invalid '{}' in response: {}", name, e)),
        )
    })
}

/// Handle for the operation a start call launched
fn operation_handle(
    data: &Value,
    context: &str,
    description: String,
) -> Result<OperationHandle> {
    let operation_id = data
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::MissingField {
            context: context.to_string(),
            field: "id".to_string(),
        })?;
    debug!(operation_id = %operation_id, "Started {}", description);
    Ok(OperationHandle::new(operation_id, description))
}
