//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default login domain for generated users
pub const DEFAULT_DOMAIN: &str = "ydbem.idp.yandexcloud.net";

/// Provisioning CLI for Yandex Cloud users, folders and YDB databases
#[derive(Parser, Debug)]
#[command(name = "ycprov")]
#[command(version, about = "Provision users, folders and YDB databases in Yandex Cloud")]
#[command(long_about = "
Provision users, folders, networks and dedicated YDB databases in Yandex Cloud.

Every command authenticates with an IAM token taken from the IAM_TOKEN
environment variable or the 'iam_token' setting in the config file.

EXAMPLES:
    # Create 10 users, each with a personal folder
    ycprov users --userpool-id ek0abc --num-users 10 --cloud-id b1gabc

    # Create a dedicated YDB database in every folder of a cloud
    ycprov ydb --cloud-id b1gabc --max-concurrent 5

    # Wait for a single operation with a spinner
    ycprov operation wait etn0123456789
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "YCPROV_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// IAM token (prefer the IAM_TOKEN environment variable)
    #[arg(long, global = true, env = "IAM_TOKEN", hide = true, hide_env_values = true)]
    pub iam_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create users with personal folders and access bindings
    Users(UsersArgs),

    /// Create a dedicated YDB database in each folder of a cloud
    Ydb(YdbArgs),

    /// Delete YDB databases
    #[command(name = "delete-ydb")]
    DeleteYdb(DeleteYdbArgs),

    /// Reset passwords for users in a userpool
    #[command(name = "reset-password")]
    ResetPassword(ResetPasswordArgs),

    /// Write ydb workload scripts for existing databases
    #[command(name = "generate-load")]
    GenerateLoad(GenerateLoadArgs),

    /// Inspect or wait on a long-running operation
    #[command(subcommand)]
    Operation(OperationCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Userpool to create users in (letters and digits, max 32 characters)
    #[arg(long)]
    pub userpool_id: String,

    /// Number of users to create (1-100)
    #[arg(long)]
    pub num_users: u32,

    /// Login domain appended to usernames
    #[arg(long)]
    pub domain: Option<String>,

    /// Cloud for personal folders (defaults to 'cloud_id' from config)
    #[arg(long)]
    pub cloud_id: Option<String>,

    /// CSV file receiving id,username,password rows
    #[arg(long, short, default_value = "created_users.txt")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct YdbArgs {
    /// Cloud whose folders receive databases (defaults to 'cloud_id' from config)
    #[arg(long)]
    pub cloud_id: Option<String>,

    /// Only these folders, instead of every folder in the cloud
    #[arg(long, value_delimiter = ',')]
    pub folder_ids: Vec<String>,

    /// Folders to leave untouched
    #[arg(long, value_delimiter = ',')]
    pub skip_folder_ids: Vec<String>,

    /// Maximum database creations in flight
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DeleteYdbArgs {
    /// Databases to delete
    #[arg(long, value_delimiter = ',', required = true)]
    pub database_ids: Vec<String>,

    /// Maximum deletions in flight
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ResetPasswordArgs {
    /// Userpool the users belong to
    #[arg(long)]
    pub userpool_id: String,

    /// Only these users, instead of every user in the pool
    #[arg(long, value_delimiter = ',')]
    pub user_ids: Vec<String>,

    /// CSV file receiving id,username,password rows
    #[arg(long, short, default_value = "created_users.txt")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct GenerateLoadArgs {
    /// Cloud whose folders are scanned (defaults to 'cloud_id' from config)
    #[arg(long)]
    pub cloud_id: Option<String>,

    /// Existing directory for the generated scripts
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Only these folders, instead of every folder in the cloud
    #[arg(long, value_delimiter = ',')]
    pub folder_ids: Vec<String>,

    /// Folders to leave out
    #[arg(long, value_delimiter = ',')]
    pub skip_folder_ids: Vec<String>,

    /// Databases launched per batch before the scripts wait (1-32)
    #[arg(long, default_value_t = 1)]
    pub batch_size: u32,
}

#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Fetch one status envelope
    Get {
        /// Operation ID
        id: String,
    },
    /// Wait until the operation finishes
    Wait {
        /// Operation ID
        id: String,

        /// Give up after this many seconds (defaults to 'polling.wait_timeout_secs')
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Trimmed, non-empty entries of a comma-separated id list
pub fn clean_ids(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
