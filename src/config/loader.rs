//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, PermitExportConfig, StatusLoggerConfig};
use super::secret::secret_string;
use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PermitExportConfig
/// 4. Applies environment variable overrides (PERMIT_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use permit_export::config::loader::load_config;
///
/// let config = load_config("permit-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PermitExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration from TOML text
pub fn parse_config(contents: &str) -> Result<PermitExportConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PermitExportConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ExportError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExportError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ExportError::Configuration(format!("Invalid value for {name}: '{raw}'"))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using PERMIT_EXPORT_* prefix
///
/// Environment variables follow the pattern: PERMIT_EXPORT_<SECTION>_<KEY>
/// For example: PERMIT_EXPORT_BLUEBEAM_CLIENT_SECRET, PERMIT_EXPORT_EXPORT_WORKERS
fn apply_env_overrides(config: &mut PermitExportConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("PERMIT_EXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Document service overrides
    if let Some(val) = env("PERMIT_EXPORT_BLUEBEAM_API_BASE_URL") {
        config.bluebeam.api_base_url = val;
    }
    if let Some(val) = env("PERMIT_EXPORT_BLUEBEAM_AUTH_SERVER") {
        config.bluebeam.auth_server = val;
    }
    if let Some(val) = env("PERMIT_EXPORT_BLUEBEAM_CLIENT_ID") {
        config.bluebeam.client_id = val;
    }
    if let Some(val) = env("PERMIT_EXPORT_BLUEBEAM_CLIENT_SECRET") {
        config.bluebeam.client_secret = secret_string(val);
    }
    if let Some(val) = env("PERMIT_EXPORT_BLUEBEAM_REDIRECT_URI") {
        config.bluebeam.redirect_uri = Some(val);
    }
    if let Some(val) = env_parse("PERMIT_EXPORT_BLUEBEAM_TIMEOUT_SECONDS")? {
        config.bluebeam.timeout_seconds = val;
    }

    // Object storage overrides
    if let Some(val) = env("PERMIT_EXPORT_STORAGE_DOMAIN") {
        config.storage.domain = Some(val);
    }
    if let Some(val) = env("PERMIT_EXPORT_STORAGE_PROXY_URL") {
        config.storage.proxy_url = Some(val);
    }
    if let Some(val) = env("PERMIT_EXPORT_STORAGE_API_KEY") {
        config.storage.api_key = Some(secret_string(val));
    }

    // Status tracker overrides
    match (
        env("PERMIT_EXPORT_STATUS_LOG_ENDPOINT"),
        env("PERMIT_EXPORT_STATUS_LOG_API_KEY"),
    ) {
        (Some(endpoint), Some(api_key)) => {
            config.status_log = Some(StatusLoggerConfig {
                endpoint,
                api_key: secret_string(api_key),
            });
        }
        (endpoint, api_key) => {
            if let Some(ref mut status_log) = config.status_log {
                if let Some(endpoint) = endpoint {
                    status_log.endpoint = endpoint;
                }
                if let Some(api_key) = api_key {
                    status_log.api_key = secret_string(api_key);
                }
            }
        }
    }

    // Database overrides
    if let Some(val) = env("PERMIT_EXPORT_DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(ExportError::Configuration(format!(
                    "Invalid PERMIT_EXPORT_DATABASE_TARGET '{other}'. Must be one of: postgresql, memory"
                )))
            }
        };
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env("PERMIT_EXPORT_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Some(val) = env_parse("PERMIT_EXPORT_POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = val;
        }
        if let Some(val) = env("PERMIT_EXPORT_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Credential overrides
    if let Some(val) = env("PERMIT_EXPORT_CREDENTIALS_ENCRYPTION_KEY") {
        config.credentials.encryption_key = secret_string(val);
    }

    // Export overrides
    if let Some(val) = env_parse("PERMIT_EXPORT_EXPORT_WORKERS")? {
        config.export.workers = val;
    }
    if let Some(val) = env_parse("PERMIT_EXPORT_EXPORT_ERROR_MESSAGE_MAX_LENGTH")? {
        config.export.error_message_max_length = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("PERMIT_EXPORT_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env("PERMIT_EXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
