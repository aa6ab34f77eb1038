use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to metadata and album calls. Asset uploads get their own
/// configurable timeout since large videos can take minutes to transfer.
pub const API_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Operator configuration for a migration run.
#[derive(Clone, Debug)]
pub struct MigrationConfig {
    /// Immich server base URL, e.g. `http://localhost:2283`
    pub server_url: String,
    /// Static API key sent on every request
    pub api_key: String,
    /// Root of the Takeout export tree
    pub takeout_path: PathBuf,
    /// Maximum units in flight within a batch
    pub max_workers: usize,
    /// Units per batch; batches run sequentially
    pub batch_size: usize,
    /// Retries for transient server errors (429/5xx)
    pub retry_attempts: u32,
    /// Timeout for a single asset upload
    pub upload_timeout: Duration,
    /// Scan and classify without any network I/O
    pub dry_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationConfig {
            server_url: "http://localhost:2283".to_string(),
            api_key: String::new(),
            takeout_path: PathBuf::new(),
            max_workers: 10,
            batch_size: 100,
            retry_attempts: 3,
            upload_timeout: Duration::from_secs(300),
            dry_run: false,
        }
    }
}

impl MigrationConfig {
    /// Pre-flight validation. Everything here is fatal: the run must not
    /// start at all with a broken configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Server URL cannot be empty".to_string(),
            ));
        }
        if !self.dry_run && self.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "API key cannot be empty".to_string(),
            ));
        }
        if !self.takeout_path.is_dir() {
            return Err(ConfigError::Validation(format!(
                "Takeout path does not exist: {}",
                self.takeout_path.display()
            )));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::Validation(
                "Worker count must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
