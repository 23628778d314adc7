//! `users`: create users, each with a personal folder and access bindings

use crate::cli::{DEFAULT_DOMAIN, UsersArgs};
use crate::connection::ConnectionManager;
use crate::error::CliResult;
use crate::names::{NameGenerator, folder_name, generate_username, phone_number};
use crate::output::CredentialsWriter;
use crate::validators;
use tracing::{error, info};
use ycprov_core::cloud::params::CreateUserRequest;
use ycprov_core::cloud::{
    create_folder_and_wait, create_user_and_wait, grant_cloud_access_and_wait,
    grant_folder_access_and_wait,
};
use ycprov_core::{CloudClient, Result as CoreResult, WaitOptions};

const FOLDER_ROLE: &str = "editor";
const CLOUD_ROLE: &str = "resource-manager.clouds.member";

pub async fn handle_users(args: &UsersArgs, conn: &ConnectionManager) -> CliResult<()> {
    let domain = args
        .domain
        .as_deref()
        .or(conn.config.domain.as_deref())
        .unwrap_or(DEFAULT_DOMAIN);
    let cloud_id = conn.cloud_id(args.cloud_id.as_deref())?;

    validators::validate_userpool_id(&args.userpool_id)?;
    validators::validate_number_of_users(args.num_users)?;
    validators::validate_domain(domain)?;
    validators::validate_output_file(&args.output)?;
    validators::validate_cloud_id(&cloud_id)?;

    let client = conn.create_client()?;
    let options = conn.config.polling.wait_options();

    info!(
        "Starting user creation: {} users in pool {}, cloud {}",
        args.num_users, args.userpool_id, cloud_id
    );

    let mut names = NameGenerator::default();
    let mut out = CredentialsWriter::create(&args.output)?;

    for i in 0..args.num_users {
        let (given_name, family_name) = names.generate_unique_name()?;
        let full_name = format!("{} {}", given_name, family_name);
        let username = generate_username(&given_name, &family_name, domain);

        let password = match client.generate_password().await {
            Ok(password) => password,
            Err(e) => {
                error!("Failed to create user {}: {}", i + 1, e);
                continue;
            }
        };

        let request = CreateUserRequest {
            userpool_id: args.userpool_id.clone(),
            username: username.clone(),
            full_name: full_name.clone(),
            given_name: given_name.clone(),
            family_name: family_name.clone(),
            email: username.clone(),
            phone_number: phone_number(i),
            password_spec: password.clone(),
            is_active: true,
        };
        let user_id = match create_user_and_wait(&client, &request, &options).await {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to create user {}: {}", i + 1, e);
                continue;
            }
        };

        let folder = folder_name(&given_name, &family_name);
        match provision_folder(&client, &cloud_id, &folder, &full_name, &user_id, &options).await {
            Ok(()) => info!("Folder and access created for user {}", username),
            Err(e) => error!(
                "Failed to create folder/access for user {}: {}",
                username, e
            ),
        }

        out.write(&user_id, &username, &password.password)?;
        info!(
            "Created user {}/{}: {} ({}) id: {}",
            i + 1,
            args.num_users,
            username,
            full_name,
            user_id
        );
    }

    info!(
        "User creation completed. Successfully created {} users. Output: {}",
        out.rows(),
        out.path().display()
    );
    println!(
        "Created {} of {} users; credentials written to {}",
        out.rows(),
        args.num_users,
        out.path().display()
    );
    Ok(())
}

/// Personal folder plus folder and cloud role bindings for a new user
async fn provision_folder(
    client: &CloudClient,
    cloud_id: &str,
    folder: &str,
    full_name: &str,
    user_id: &str,
    options: &WaitOptions,
) -> CoreResult<()> {
    let description = format!("Personal folder for user {}", full_name);
    let folder_id =
        create_folder_and_wait(client, cloud_id, folder, Some(&description), options).await?;
    grant_folder_access_and_wait(client, &folder_id, user_id, FOLDER_ROLE, options).await?;
    grant_cloud_access_and_wait(client, cloud_id, user_id, CLOUD_ROLE, options).await?;
    Ok(())
}
