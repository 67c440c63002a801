use anyhow::{Context, Result, bail};
use alloy::primitives::U256;
use alloy::primitives::utils::format_ether;
use golembase_client::{AccountProvider, AlloyNode, ClientConfig, LocalAccount};
use std::path::Path;
use tracing::info;

use crate::cli::AccountCommands;

use super::load_account;

pub async fn handle_account_command(
    command: AccountCommands,
    config: &ClientConfig,
    key_file: &Path,
) -> Result<()> {
    match command {
        AccountCommands::Create { force } => {
            let account = LocalAccount::random();
            store_account(&account, key_file, force)?;

            println!("🔑 New account created");
            println!("   Address:  {}", account.address());
            println!("   Key file: {}", key_file.display());
        }

        AccountCommands::Import { private_key, force } => {
            let account = LocalAccount::from_private_key(&private_key)?;
            store_account(&account, key_file, force)?;

            println!("🔑 Account imported");
            println!("   Address:  {}", account.address());
            println!("   Key file: {}", key_file.display());
        }

        AccountCommands::Address => {
            let account = load_account(config, key_file)?;
            println!("{}", account.address());
        }

        AccountCommands::Balance => {
            let account = load_account(config, key_file)?;
            let node = AlloyNode::connect(&config.node_url)?;

            let balance = node
                .balance(account.address())
                .await
                .with_context(|| format!("Failed to fetch balance from {}", node.url()))?;

            println!("📊 Account {}", account.address());
            println!("💰 Balance: {}", format_balance(balance));
        }
    }

    Ok(())
}

fn format_balance(wei: U256) -> String {
    format!("{} ETH ({} wei)", format_ether(wei), wei)
}

fn store_account(account: &LocalAccount, key_file: &Path, force: bool) -> Result<()> {
    if key_file.exists() && !force {
        bail!(
            "Key file {} already exists, pass --force to replace it",
            key_file.display()
        );
    }

    account
        .save(key_file)
        .with_context(|| format!("Failed to write key file {}", key_file.display()))?;
    info!("Stored account {} in {}", account.address(), key_file.display());
    Ok(())
}
