//! Control-plane client, request payloads and start-and-wait workflows

pub mod client;
pub mod params;
pub mod workflows;

pub use client::CloudClient;
pub use params::{
    AccessBinding, Database, Folder, Network, PasswordSpec, Subject, Subnet, User,
    first_with_storage_groups, has_dedicated_storage, is_valid_database_name,
};
pub use workflows::{
    Vpc, create_folder_and_wait, create_user_and_wait, ensure_vpc, find_complete_vpc,
    grant_cloud_access_and_wait, grant_folder_access_and_wait, reset_password_and_wait,
};
