//! `operation get` / `operation wait`

use crate::cli::OperationCommands;
use crate::connection::ConnectionManager;
use crate::error::{CliError, CliResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;
use ycprov_core::{ProgressCallback, ProgressEvent, fetch_status, wait_for_operation};

pub async fn handle_operation_command(
    command: &OperationCommands,
    conn: &ConnectionManager,
) -> CliResult<()> {
    match command {
        OperationCommands::Get { id } => get_operation(id, conn).await,
        OperationCommands::Wait { id, timeout } => wait_operation(id, *timeout, conn).await,
    }
}

async fn get_operation(id: &str, conn: &ConnectionManager) -> CliResult<()> {
    let client = conn.create_client()?;
    let operation = fetch_status(&client, id, &conn.config.polling.retry_policy()).await?;
    println!("{}", serde_json::to_string_pretty(&operation)?);
    Ok(())
}

async fn wait_operation(id: &str, timeout: Option<u64>, conn: &ConnectionManager) -> CliResult<()> {
    let client = conn.create_client()?;
    let mut options = conn.config.polling.wait_options();
    if let Some(secs) = timeout {
        options.timeout = Duration::from_secs(secs);
    }
    debug!("Waiting for operation {} with {:?}", id, options);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .map_err(|e| CliError::Configuration(e.to_string()))?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Waiting for operation {}", id));

    let pb_clone = pb.clone();
    let progress_callback: ProgressCallback = Box::new(move |event| match event {
        ProgressEvent::Started { operation_id } => {
            pb_clone.set_message(format!("Operation {} started", operation_id));
        }
        ProgressEvent::Polling {
            operation_id,
            elapsed,
        } => {
            pb_clone.set_message(format!(
                "Operation {}: \u{21bb} running ({}s)",
                operation_id,
                elapsed.as_secs()
            ));
        }
        ProgressEvent::Completed {
            operation_id,
            resource_id,
        } => {
            let created = resource_id
                .map(|r| format!(" (resource {})", r))
                .unwrap_or_default();
            pb_clone.finish_with_message(format!(
                "Operation {}: \u{2713} done{}",
                operation_id, created
            ));
        }
        ProgressEvent::Failed {
            operation_id,
            error,
        } => {
            pb_clone.finish_with_message(format!(
                "Operation {}: \u{2717} {}",
                operation_id, error
            ));
        }
    });

    let result = wait_for_operation(
        &client,
        id,
        &format!("operation {}", id),
        &options,
        Some(progress_callback),
    )
    .await;

    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            if !pb.is_finished() {
                pb.finish_with_message(format!("Operation {} failed", id));
            }
            Err(CliError::from(e))
        }
    }
}
