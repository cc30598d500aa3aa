//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "permit-export.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing permit-export configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your secrets:");
                println!("     - BLUEBEAM_CLIENT_SECRET");
                println!("     - PERMIT_EXPORT_ENCRYPTION_KEY (a Fernet key)");
                println!("     - PERMIT_EXPORT_PG_URL");
                println!("  3. Validate configuration: permit-export validate-config");
                println!("  4. Print the authorization page: permit-export authorize-url");
                println!("  5. Store the credential: permit-export authorize --code <code>");
                println!("  6. Run export: permit-export export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# permit-export configuration

database_target = "postgresql"

[bluebeam]
api_base_url = "https://studioapi.bluebeam.com/publicapi/v1"
auth_server = "https://authserver.bluebeam.com"
client_id = "your-client-id"
client_secret = "${BLUEBEAM_CLIENT_SECRET}"
redirect_uri = "https://localhost/oauth/callback"

[postgresql]
connection_string = "${PERMIT_EXPORT_PG_URL}"

[credentials]
encryption_key = "${PERMIT_EXPORT_ENCRYPTION_KEY}"

[logging]
local_enabled = true
local_path = "/var/log/permit-export"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# permit-export configuration
# Exports building-permit submissions into Bluebeam Studio projects
#
# Values of the form ${VAR} are replaced from the environment.
# Any setting can also be overridden with PERMIT_EXPORT_<SECTION>_<KEY>.

# development, staging or production (production requires https:// URLs)
environment = "development"

# Storage backend: "postgresql", or "memory" for local dry runs
database_target = "postgresql"

[application]
log_level = "info"

[bluebeam]
api_base_url = "https://studioapi.bluebeam.com/publicapi/v1"
auth_server = "https://authserver.bluebeam.com"
client_id = "your-client-id"
client_secret = "${BLUEBEAM_CLIENT_SECRET}"
# Used by `authorize-url` and `authorize` when --redirect-uri is not given
redirect_uri = "https://localhost/oauth/callback"
timeout_seconds = 60
connect_timeout_seconds = 30
invite_message = "You have been granted access to a new permit submission."

# Folders created in every new project. Exactly one folder is marked with
# uploads = true; documents go into a dated folder below it.
[directories]
submittal_prefix = "SUBMITTAL"

[[directories.tree]]
name = "CCSF EPR"

[[directories.tree.subdirs]]
name = "A.PERMIT SUBMITTAL"
subdirs = [
    { name = "1.PERMIT FORMS" },
    { name = "2.ROUTING FORMS" },
    { name = "3.DOCUMENTS FOR REVIEW", uploads = true },
]

[[directories.tree.subdirs]]
name = "B.APPROVED DOCUMENTS"
subdirs = [{ name = "1.BUILDING PERMIT DOCUMENTS" }]

# Files hosted on this domain are fetched through the proxy
[storage]
# domain = "bucketeer.s3.amazonaws.com"
# proxy_url = "https://files.example.org/proxy"
# api_key = "${STORAGE_PROXY_API_KEY}"

# Status tracker written to when a submission carries a "logger" block
# [status_log]
# endpoint = "https://tracker.example.org/api"
# api_key = "${STATUS_LOG_API_KEY}"

[postgresql]
connection_string = "${PERMIT_EXPORT_PG_URL}"
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 60
ssl_mode = "prefer"

[credentials]
# Generate with: python -c "from cryptography.fernet import Fernet; print(Fernet.generate_key().decode())"
encryption_key = "${PERMIT_EXPORT_ENCRYPTION_KEY}"

[export]
# Stored submission error messages are cut to this many characters
error_message_max_length = 255
workers = 2
queue_capacity = 16
# Characters of request/response bodies written to the debug audit log
audit_body_limit = 500
shutdown_timeout_secs = 30

[logging]
local_enabled = true
local_path = "/var/log/permit-export"
local_rotation = "daily"
"#
        .to_string()
    }
}
