//! Connection management for the control-plane client

use crate::error::{CliError, CliResult};
use tracing::debug;
use ycprov_core::{CloudClient, Config};

/// Config plus the token override from the command line
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    iam_token: Option<String>,
}

impl ConnectionManager {
    pub fn new(config: Config, iam_token: Option<String>) -> Self {
        Self {
            config,
            iam_token: iam_token.filter(|t| !t.is_empty()),
        }
    }

    /// Create an authenticated client; the `--iam-token`/`IAM_TOKEN` value wins
    /// over the config file
    pub fn create_client(&self) -> CliResult<CloudClient> {
        let token = match &self.iam_token {
            Some(token) => token.clone(),
            None => self.config.resolve_iam_token()?,
        };
        debug!("Creating control-plane client");
        Ok(CloudClient::new(token, self.config.endpoints.clone())?)
    }

    /// `--cloud-id` if given, otherwise `cloud_id` from the config file
    pub fn cloud_id(&self, explicit: Option<&str>) -> CliResult<String> {
        match explicit {
            Some(id) => Ok(id.to_string()),
            None => self
                .config
                .require_cloud_id()
                .map(str::to_string)
                .map_err(|_| {
                    CliError::invalid("--cloud-id is required (or set 'cloud_id' in the config file)")
                }),
        }
    }

    /// Ceiling for batch workflows: explicit flag, else `[polling]` setting
    pub fn max_concurrent(&self, explicit: Option<usize>) -> usize {
        explicit.unwrap_or(self.config.polling.max_concurrent_operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_token_wins() {
        let config = Config {
            iam_token: Some("t1.file".to_string()),
            ..Config::default()
        };
        let conn = ConnectionManager::new(config, Some("t1.flag".to_string()));
        assert!(conn.create_client().is_ok());
    }

    #[test]
    fn test_cloud_id_resolution() {
        let conn = ConnectionManager::new(Config::default(), None);
        assert!(matches!(conn.cloud_id(None), Err(CliError::InvalidInput { .. })));
        assert_eq!(conn.cloud_id(Some("b1gflag")).unwrap(), "b1gflag");

        let conn = ConnectionManager::new(
            Config {
                cloud_id: Some("b1gfile".to_string()),
                ..Config::default()
            },
            None,
        );
        assert_eq!(conn.cloud_id(None).unwrap(), "b1gfile");
    }

    #[test]
    fn test_max_concurrent_defaults_to_config() {
        let conn = ConnectionManager::new(Config::default(), None);
        assert_eq!(conn.max_concurrent(None), 15);
        assert_eq!(conn.max_concurrent(Some(5)), 5);
    }
}
