//! `ydb`: one dedicated YDB database per folder, bounded by the batch runner

use crate::cli::{YdbArgs, clean_ids};
use crate::connection::ConnectionManager;
use crate::error::CliResult;
use crate::validators;
use std::collections::HashSet;
use tracing::{error, info};
use ycprov_core::cloud::params::CreateDatabaseRequest;
use ycprov_core::cloud::{Folder, ensure_vpc, has_dedicated_storage};
use ycprov_core::{BatchRunner, BatchSummary, CloudClient};

pub async fn handle_ydb(args: &YdbArgs, conn: &ConnectionManager) -> CliResult<()> {
    let cloud_id = conn.cloud_id(args.cloud_id.as_deref())?;
    validators::validate_cloud_id(&cloud_id)?;

    let client = conn.create_client()?;
    info!("Starting YDB creation mode for cloud {}", cloud_id);

    let skip: HashSet<String> = clean_ids(&args.skip_folder_ids).into_iter().collect();
    if !skip.is_empty() {
        info!("Will skip folders: {:?}", skip);
    }

    let folders = target_folders(&client, &cloud_id, &args.folder_ids).await?;
    let ceiling = conn.max_concurrent(args.max_concurrent);
    let mut runner = BatchRunner::new(
        &client,
        "YDB database creation",
        ceiling,
        conn.config.polling.sweep_options(),
    );
    let mut skipped = 0usize;

    for folder in &folders {
        if skip.contains(&folder.id) {
            info!("Skipping folder {} (ID: {})", folder.name, folder.id);
            skipped += 1;
            continue;
        }

        let request = match prepare_database(&client, conn, folder).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                skipped += 1;
                continue;
            }
            Err(e) => {
                error!(
                    "Failed to start YDB for folder {} (ID: {}): {}",
                    folder.name, folder.id, e
                );
                continue;
            }
        };

        if let Err(e) = runner
            .start(|| client.start_database_creation(&request))
            .await
        {
            error!(
                "Failed to start YDB for folder {} (ID: {}): {}",
                folder.name, folder.id, e
            );
        }
    }

    let summary = runner.finish().await;
    info!(
        "YDB creation completed. Created {} databases, skipped {} folders",
        summary.succeeded, skipped
    );
    print_summary("created", &summary, skipped);
    Ok(())
}

/// Folders named on the command line, or every folder in the cloud
pub(crate) async fn target_folders(
    client: &CloudClient,
    cloud_id: &str,
    folder_ids: &[String],
) -> CliResult<Vec<Folder>> {
    let ids = clean_ids(folder_ids);
    if ids.is_empty() {
        return Ok(client.list_folders(cloud_id).await?);
    }
    info!("Using provided folder IDs: {:?}", ids);
    Ok(ids.into_iter().map(Folder::from_id).collect())
}

/// `None` when the folder already holds a dedicated database
async fn prepare_database(
    client: &CloudClient,
    conn: &ConnectionManager,
    folder: &Folder,
) -> ycprov_core::Result<Option<CreateDatabaseRequest>> {
    let existing = client.list_databases(&folder.id).await?;
    if has_dedicated_storage(&existing) {
        info!(
            "Folder {} (ID: {}) already has a dedicated YDB database (groupCount>1). Skipping.",
            folder.name, folder.id
        );
        return Ok(None);
    }

    let provisioning = &conn.config.provisioning;
    let vpc = ensure_vpc(
        client,
        &folder.id,
        &folder.name,
        provisioning,
        &conn.config.polling.wait_options(),
    )
    .await?;

    CreateDatabaseRequest::dedicated(
        &folder.id,
        &format!("ydb-{}", folder.name),
        &format!("YDB database for folder {}", folder.name),
        &vpc.network_id,
        &vpc.subnet_ids,
        provisioning,
    )
    .map(Some)
}

pub(crate) fn print_summary(verb: &str, summary: &BatchSummary, skipped: usize) {
    println!(
        "{} {} of {} databases ({} failed, {} unreachable, {} timed out, {} could not start)",
        capitalize(verb),
        summary.succeeded,
        summary.started,
        summary.failed,
        summary.unreachable,
        summary.timed_out,
        summary.start_failures
    );
    if skipped > 0 {
        println!("Skipped {} folders", skipped);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("created"), "Created");
        assert_eq!(capitalize(""), "");
    }
}
