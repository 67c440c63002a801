use clap::{Args, Parser, Subcommand};
use golembase_storagetx::{EntityKey, NumericAnnotation, StringAnnotation};
use std::path::PathBuf;

use crate::annotations::{parse_numeric_annotation, parse_string_annotation};

#[derive(Parser, Debug)]
#[command(name = "golembase")]
#[command(about = "Golem Base entity storage client", long_about = None)]
pub struct Cli {
    /// TOML client configuration
    #[arg(long, global = true, env = "GOLEMBASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON-RPC URL of the node, overrides the configuration
    #[arg(long, global = true, env = "NODE_URL")]
    pub node_url: Option<String>,

    /// Private key file (default: ~/.config/golembase/private.key)
    #[arg(long, global = true, env = "GOLEMBASE_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the local signing account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Create, update and delete entities
    Entity {
        /// Give up waiting for the receipt after this many seconds
        #[arg(long, global = true, env = "GOLEMBASE_CONFIRMATION_TIMEOUT")]
        timeout: Option<u64>,

        #[command(subcommand)]
        command: EntityCommands,
    },

    /// Query entities by annotation, e.g. `foo = "bar"`
    Query {
        /// Query expression
        query: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Generate a new private key and store it in the key file
    Create {
        /// Replace an existing key file
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Store an existing hex private key in the key file
    Import {
        #[arg(long, env = "GOLEMBASE_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        /// Replace an existing key file
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Show the account address
    Address,

    /// Show the account balance
    Balance,
}

#[derive(Subcommand, Debug)]
pub enum EntityCommands {
    /// Create a new entity
    Create {
        #[command(flatten)]
        content: EntityContent,
    },

    /// Replace the payload, TTL and annotations of an entity
    Update {
        /// Key of the entity to update
        #[arg(long)]
        key: EntityKey,

        #[command(flatten)]
        content: EntityContent,
    },

    /// Delete an entity
    Delete {
        /// Key of the entity to delete
        #[arg(long)]
        key: EntityKey,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EntityContent {
    /// Payload stored in the entity
    #[arg(long, env = "ENTITY_DATA", default_value = "this is a test")]
    pub data: String,

    /// Lifetime in blocks
    #[arg(long, env = "ENTITY_TTL", default_value = "100")]
    pub ttl: u64,

    /// String annotation as key=value, repeatable
    #[arg(long = "string", value_name = "KEY=VALUE", value_parser = parse_string_annotation)]
    pub string_annotations: Vec<StringAnnotation>,

    /// Numeric annotation as key=number, repeatable
    #[arg(long = "numeric", value_name = "KEY=NUMBER", value_parser = parse_numeric_annotation)]
    pub numeric_annotations: Vec<NumericAnnotation>,
}
