//! Users command implementation
//!
//! Manages the users granted full control of every new project.

use super::context::{exit_code_for, load_valid_config, AppContext};
use clap::{Args, Subcommand};

/// Arguments for the users command
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// Register a user by e-mail
    Add {
        email: String,
    },
    /// List registered users
    List,
}

impl UsersArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let ctx = match AppContext::connect_or_exit(config).await {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };
        let service = ctx.service();

        let result = match &self.action {
            UsersAction::Add { email } => service.add_user(email).await.map(|user| {
                println!("✅ Registered {} (id {})", user.email, user.id);
            }),
            UsersAction::List => service.list_users().await.map(|users| {
                if users.is_empty() {
                    println!("No users registered.");
                }
                for user in users {
                    println!("{:>6}  {}", user.id, user.email);
                }
            }),
        };

        match result {
            Ok(()) => Ok(0),
            Err(e) => {
                println!("❌ {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
