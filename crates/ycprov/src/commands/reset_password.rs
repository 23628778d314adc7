//! `reset-password`: new passwords for existing users in a userpool

use crate::cli::{ResetPasswordArgs, clean_ids};
use crate::connection::ConnectionManager;
use crate::error::CliResult;
use crate::output::CredentialsWriter;
use crate::validators;
use std::collections::HashMap;
use tracing::{error, info};
use ycprov_core::cloud::reset_password_and_wait;

pub async fn handle_reset_password(
    args: &ResetPasswordArgs,
    conn: &ConnectionManager,
) -> CliResult<()> {
    validators::validate_userpool_id(&args.userpool_id)?;
    validators::validate_output_file(&args.output)?;

    let client = conn.create_client()?;
    let options = conn.config.polling.wait_options();

    info!(
        "Listing users from userpool {} to build username map",
        args.userpool_id
    );
    let users = client.list_users(&args.userpool_id).await?;

    let requested = clean_ids(&args.user_ids);
    let targets: Vec<String> = if requested.is_empty() {
        info!("Collected {} user(s) to reset from userpool", users.len());
        users.iter().map(|u| u.id.clone()).collect()
    } else {
        info!("Resetting password for provided {} user(s)", requested.len());
        requested
    };
    let username_by_id: HashMap<String, String> =
        users.into_iter().map(|u| (u.id, u.username)).collect();

    let mut out = CredentialsWriter::create(&args.output)?;
    let mut failures = 0usize;

    for user_id in &targets {
        match reset_password_and_wait(&client, user_id, &options).await {
            Ok(password) => {
                let username = username_by_id.get(user_id).map(String::as_str).unwrap_or("");
                out.write(user_id, username, &password.password)?;
            }
            Err(e) => {
                error!("Failed to reset password for user {}: {}", user_id, e);
                failures += 1;
            }
        }
    }

    info!(
        "Password reset completed. Success: {}, Failed: {}",
        out.rows(),
        failures
    );
    println!(
        "Reset {} passwords ({} failed); credentials written to {}",
        out.rows(),
        failures,
        out.path().display()
    );
    Ok(())
}
