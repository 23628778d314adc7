//! `generate-load`: bash scripts that drive `ydb workload kv` against one
//! database per folder

use super::ydb::target_folders;
use crate::cli::{GenerateLoadArgs, clean_ids};
use crate::connection::ConnectionManager;
use crate::error::{CliError, CliResult};
use crate::validators;
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};
use ycprov_core::cloud::first_with_storage_groups;

const INIT_SCRIPT: &str = "init.bash";
const RUN_SCRIPT: &str = "run-mixed-and-select.bash";
const SHEBANG: &str = "#!/usr/bin/env bash\n";

/// Script bodies for a set of target databases
///
/// Every `batch_size` databases the scripts `wait` for the background jobs
/// launched so far; a trailing `wait` keeps the scripts in the foreground
/// until the last batch finishes.
#[derive(Debug)]
pub struct LoadScripts {
    cloud_id: String,
    batch_size: usize,
    init: String,
    run: String,
    databases: usize,
}

impl LoadScripts {
    pub fn new(cloud_id: &str, batch_size: u32) -> Self {
        Self {
            cloud_id: cloud_id.to_string(),
            batch_size: batch_size.max(1) as usize,
            init: SHEBANG.to_string(),
            run: SHEBANG.to_string(),
            databases: 0,
        }
    }

    pub fn add_database(&mut self, database_id: &str, endpoint: &str) {
        let ydb = format!(
            "ydb --use-metadata-credentials -e {} -d /ru-central1/{}/{}",
            endpoint, self.cloud_id, database_id
        );
        self.init.push_str(&format!(
            "{} workload kv init --auto-partition 0 --max-partitions 1 --min-partitions 1 > init-{} 2>&1 &\n",
            ydb, database_id
        ));
        self.run.push_str(&format!(
            "{} workload kv run mixed -t 300 --seconds 3600 > mixed-{} 2>&1 &\n",
            ydb, database_id
        ));
        self.run.push_str(&format!(
            "{} workload kv run select --threads 100 --seconds 3600 --rows 100 > select-{} 2>&1 &\n",
            ydb, database_id
        ));
        self.databases += 1;

        if self.databases % self.batch_size == 0 {
            self.init.push_str("wait\n");
            self.run.push_str("wait\n");
        }
    }

    pub fn databases(&self) -> usize {
        self.databases
    }

    /// Final script bodies, `(init, run)`
    pub fn finish(mut self) -> (String, String) {
        if self.databases % self.batch_size != 0 {
            self.init.push_str("wait\n");
            self.run.push_str("wait\n");
        }
        (self.init, self.run)
    }
}

pub async fn handle_generate_load(
    args: &GenerateLoadArgs,
    conn: &ConnectionManager,
) -> CliResult<()> {
    let cloud_id = conn.cloud_id(args.cloud_id.as_deref())?;
    validators::validate_cloud_id(&cloud_id)?;
    validators::validate_batch_size(args.batch_size)?;
    validators::validate_output_dir(&args.output_dir)?;

    let client = conn.create_client()?;
    let folders = target_folders(&client, &cloud_id, &args.folder_ids).await?;
    info!(
        "generate-load: {} folders in cloud {}",
        folders.len(),
        cloud_id
    );
    let skip: HashSet<String> = clean_ids(&args.skip_folder_ids).into_iter().collect();

    let mut scripts = LoadScripts::new(&cloud_id, args.batch_size);
    for folder in &folders {
        if skip.contains(&folder.id) {
            info!(
                "generate-load: skipping folder {} (ID: {})",
                folder.name, folder.id
            );
            continue;
        }

        let databases = match client.list_databases(&folder.id).await {
            Ok(databases) => databases,
            Err(e) => {
                error!(
                    "generate-load: failed to list YDB in folder {}: {}",
                    folder.id, e
                );
                continue;
            }
        };

        match first_with_storage_groups(&databases) {
            Some(db) => scripts.add_database(&db.id, &db.endpoint),
            None => info!(
                "generate-load: no YDB with storage groups found in folder {}",
                folder.id
            ),
        }
    }

    let targeted = scripts.databases();
    let (init, run) = scripts.finish();
    write_script(&args.output_dir.join(INIT_SCRIPT), &init)?;
    write_script(&args.output_dir.join(RUN_SCRIPT), &run)?;

    info!(
        "generate-load: wrote scripts to {}. Databases targeted: {}",
        args.output_dir.display(),
        targeted
    );
    println!(
        "Wrote {} and {} to {} ({} databases)",
        INIT_SCRIPT,
        RUN_SCRIPT,
        args.output_dir.display(),
        targeted
    );
    Ok(())
}

fn write_script(path: &Path, contents: &str) -> CliResult<()> {
    std::fs::write(path, contents).map_err(|e| CliError::file(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
            warn!("Failed to make {} executable: {}", path.display(), e);
        }
    }

    Ok(())
}
