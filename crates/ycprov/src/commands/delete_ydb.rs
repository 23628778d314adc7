//! `delete-ydb`: tear down databases through the batch runner

use super::ydb::print_summary;
use crate::cli::{DeleteYdbArgs, clean_ids};
use crate::connection::ConnectionManager;
use crate::error::{CliError, CliResult};
use tracing::{error, info};
use ycprov_core::BatchRunner;

pub async fn handle_delete_ydb(args: &DeleteYdbArgs, conn: &ConnectionManager) -> CliResult<()> {
    let database_ids = clean_ids(&args.database_ids);
    if database_ids.is_empty() {
        return Err(CliError::invalid("--database-ids must name at least one database"));
    }

    let client = conn.create_client()?;
    let mut runner = BatchRunner::new(
        &client,
        "YDB database deletion",
        conn.max_concurrent(args.max_concurrent),
        conn.config.polling.sweep_options(),
    );

    info!("Deleting {} YDB databases", database_ids.len());
    for database_id in &database_ids {
        if let Err(e) = runner
            .start(|| client.start_database_deletion(database_id))
            .await
        {
            error!("Failed to start deletion of database {}: {}", database_id, e);
        }
    }

    let summary = runner.finish().await;
    info!(
        "YDB deletion completed. Deleted {} of {} databases",
        summary.succeeded,
        database_ids.len()
    );
    print_summary("deleted", &summary, 0);
    Ok(())
}
