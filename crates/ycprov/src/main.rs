use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ycprov_core::Config;

mod cli;
mod commands;
mod connection;
mod error;
mod names;
mod output;
mod validators;

use cli::{Cli, Commands, OperationCommands};
use connection::ConnectionManager;
use error::CliError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    let config = match &cli.config_file {
        Some(path) => {
            debug!("Loading config from explicit path: {:?}", path);
            Config::load_from_path(path)
        }
        None => {
            debug!("Loading config from default location");
            Config::load()
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            CliError::from(e).print_diagnostic();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::new(config, cli.iam_token.clone());

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "ycprov=info,ycprov_core=info",
            1 => "ycprov=debug,ycprov_core=debug",
            _ => "ycprov=trace,ycprov_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), CliError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            println!("ycprov {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Users(args) => commands::users::handle_users(args, conn_mgr).await,
        Commands::Ydb(args) => commands::ydb::handle_ydb(args, conn_mgr).await,
        Commands::DeleteYdb(args) => commands::delete_ydb::handle_delete_ydb(args, conn_mgr).await,
        Commands::ResetPassword(args) => {
            commands::reset_password::handle_reset_password(args, conn_mgr).await
        }
        Commands::GenerateLoad(args) => {
            commands::generate_load::handle_generate_load(args, conn_mgr).await
        }
        Commands::Operation(cmd) => {
            commands::operation::handle_operation_command(cmd, conn_mgr).await
        }
    };

    debug!("Command finished in {:.2?}", start.elapsed());
    result
}

/// Command summary for logs; never includes secrets
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Users(args) => format!(
            "users --userpool-id {} --num-users {}",
            args.userpool_id, args.num_users
        ),
        Commands::Ydb(args) => format!(
            "ydb ({} folders requested, {} skipped)",
            args.folder_ids.len(),
            args.skip_folder_ids.len()
        ),
        Commands::DeleteYdb(args) => format!("delete-ydb ({} databases)", args.database_ids.len()),
        Commands::ResetPassword(args) => {
            format!("reset-password --userpool-id {}", args.userpool_id)
        }
        Commands::GenerateLoad(args) => {
            format!("generate-load --output-dir {}", args.output_dir.display())
        }
        Commands::Operation(OperationCommands::Get { id }) => format!("operation get {}", id),
        Commands::Operation(OperationCommands::Wait { id, .. }) => format!("operation wait {}", id),
    }
}
