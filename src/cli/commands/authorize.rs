//! Authorization commands
//!
//! `authorize-url` prints the page an operator visits to grant access;
//! `authorize` exchanges the code that page returns and stores the credential.

use super::context::{exit_code_for, load_valid_config, AppContext, EXIT_CONFIG};
use crate::adapters::bluebeam::BluebeamClient;
use clap::Args;

fn redirect_uri(arg: &Option<String>, configured: &Option<String>) -> Option<String> {
    arg.clone().or_else(|| configured.clone())
}

/// Arguments for the authorize-url command
#[derive(Args, Debug)]
pub struct AuthorizeUrlArgs {
    /// Redirect URI registered for the client (defaults to bluebeam.redirect_uri)
    #[arg(long)]
    pub redirect_uri: Option<String>,
}

impl AuthorizeUrlArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let Some(redirect) = redirect_uri(&self.redirect_uri, &config.bluebeam.redirect_uri) else {
            println!("❌ No redirect URI: pass --redirect-uri or set bluebeam.redirect_uri");
            return Ok(EXIT_CONFIG);
        };

        let client = BluebeamClient::new(&config.bluebeam, config.export.audit_body_limit)?;
        match client.authorization_url(&redirect) {
            Ok(url) => {
                println!("{url}");
                Ok(0)
            }
            Err(e) => {
                println!("❌ {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}

/// Arguments for the authorize command
#[derive(Args, Debug)]
pub struct AuthorizeArgs {
    /// Authorization code returned to the redirect URI
    #[arg(long)]
    pub code: String,

    /// Redirect URI used to obtain the code (defaults to bluebeam.redirect_uri)
    #[arg(long)]
    pub redirect_uri: Option<String>,
}

impl AuthorizeArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let Some(redirect) = redirect_uri(&self.redirect_uri, &config.bluebeam.redirect_uri) else {
            println!("❌ No redirect URI: pass --redirect-uri or set bluebeam.redirect_uri");
            return Ok(EXIT_CONFIG);
        };
        let ctx = match AppContext::connect_or_exit(config).await {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        match ctx.credentials.authorize(&self.code, &redirect).await {
            Ok(credential) => {
                println!(
                    "✅ Authorized as {} (expires {})",
                    credential.user_name.as_deref().unwrap_or("unknown account"),
                    credential.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Authorization failed");
                println!("❌ Authorization failed: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
