mod account;
mod entity;
mod query;

use anyhow::{Context, Result, anyhow};
use golembase_client::{ClientConfig, LocalAccount};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands};

pub async fn execute(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.node_url)?;
    let key_file = resolve_key_file(cli.key_file)?;

    match cli.command {
        Commands::Account { command } => account::handle_account_command(command, &config, &key_file).await,
        Commands::Entity { timeout, command } => {
            let mut config = config;
            if timeout.is_some() {
                config.confirmation_timeout_secs = timeout;
            }
            entity::handle_entity_command(command, &config, &key_file, &cancel).await
        }
        Commands::Query { query } => query::handle_query(&config, &query).await,
    }
}

/// Configuration file if given, defaults otherwise; the node URL flag wins
fn load_config(path: Option<&Path>, node_url: Option<String>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(node_url) = node_url {
        config.node_url = node_url;
    }

    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn resolve_key_file(key_file: Option<PathBuf>) -> Result<PathBuf> {
    key_file
        .or_else(LocalAccount::default_key_path)
        .ok_or_else(|| anyhow!("Cannot determine the key file location, pass --key-file"))
}

/// Account from `key_file`, bound to the configured chain if any
fn load_account(config: &ClientConfig, key_file: &Path) -> Result<LocalAccount> {
    let account = LocalAccount::load(key_file).with_context(|| {
        format!(
            "No usable account at {}, run `golembase account create` first",
            key_file.display()
        )
    })?;
    Ok(account.with_chain_id(config.chain_id))
}
