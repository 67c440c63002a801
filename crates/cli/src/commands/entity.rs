use anyhow::{Result, anyhow};
use golembase_client::{AlloyNode, ClientConfig, Confirmation, StorageClientError, Submitter};
use golembase_storagetx::{Create, StorageTransaction, Update};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::cli::{EntityCommands, EntityContent};

use super::load_account;

pub async fn handle_entity_command(
    command: EntityCommands,
    config: &ClientConfig,
    key_file: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let tx = storage_transaction(command);

    let account = load_account(config, key_file)?;
    let node = AlloyNode::connect(&config.node_url)?;
    let submitter = Submitter::from_config(node, account, config)?;

    match submitter.submit(&tx, cancel).await {
        Ok(confirmation) => {
            print_confirmation(&confirmation);
            Ok(())
        }
        Err(e) => {
            report_failure(&e);
            Err(anyhow!(e))
        }
    }
}

fn storage_transaction(command: EntityCommands) -> StorageTransaction {
    match command {
        EntityCommands::Create { content } => {
            let mut create = Create::new(content.ttl, content.data.into_bytes());
            create.string_annotations = content.string_annotations;
            create.numeric_annotations = content.numeric_annotations;
            StorageTransaction::new().with_create(create)
        }
        EntityCommands::Update { key, content } => {
            let EntityContent {
                data,
                ttl,
                string_annotations,
                numeric_annotations,
            } = content;
            let mut update = Update::new(key, ttl, data.into_bytes());
            update.string_annotations = string_annotations;
            update.numeric_annotations = numeric_annotations;
            StorageTransaction::new().with_update(update)
        }
        EntityCommands::Delete { key } => StorageTransaction::new().with_delete(key),
    }
}

fn print_confirmation(confirmation: &Confirmation) {
    println!("✅ Transaction {} confirmed", confirmation.transaction_hash);
    if let Some(block) = confirmation.block_number {
        println!("   Block: {}", block);
    }
    for key in confirmation.created_keys() {
        println!("   Created: {}", key);
    }
    for key in confirmation.updated_keys() {
        println!("   Updated: {}", key);
    }
    for key in confirmation.deleted_keys() {
        println!("   Deleted: {}", key);
    }
}

fn report_failure(error: &StorageClientError) {
    match error.tx_hash() {
        Some(tx_hash) if error.is_indeterminate() => {
            eprintln!("⚠️  Outcome of transaction {} is unknown", tx_hash);
            eprintln!("   It may still be included, check its receipt before resubmitting");
        }
        Some(tx_hash) => eprintln!("❌ Transaction {} did not apply: {}", tx_hash, error),
        None if error.is_unsent() => eprintln!("❌ Nothing was sent: {}", error),
        None => eprintln!("❌ {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use golembase_storagetx::{EntityKey, NumericAnnotation, StringAnnotation};

    fn content() -> EntityContent {
        EntityContent {
            data: "this is a test".to_string(),
            ttl: 100,
            string_annotations: vec![StringAnnotation::new("foo", "bar")],
            numeric_annotations: vec![NumericAnnotation::new("n", 1)],
        }
    }

    #[test]
    fn test_create_transaction() {
        let tx = storage_transaction(EntityCommands::Create { content: content() });

        assert_eq!(tx.create.len(), 1);
        assert!(tx.update.is_empty() && tx.delete.is_empty());
        assert_eq!(tx.create[0].ttl, 100);
        assert_eq!(tx.create[0].payload.as_ref(), b"this is a test");
        assert_eq!(tx.create[0].string_annotations, vec![StringAnnotation::new("foo", "bar")]);
        assert_eq!(tx.create[0].numeric_annotations, vec![NumericAnnotation::new("n", 1)]);
    }

    #[test]
    fn test_update_transaction() {
        let key = EntityKey::repeat_byte(0x01);
        let tx = storage_transaction(EntityCommands::Update {
            key,
            content: content(),
        });

        assert_eq!(tx.update.len(), 1);
        assert_eq!(tx.update[0].entity_key, key);
        assert_eq!(tx.update[0].payload.as_ref(), b"this is a test");
    }

    #[test]
    fn test_delete_transaction() {
        let key = EntityKey::repeat_byte(0x02);
        let tx = storage_transaction(EntityCommands::Delete { key });
        assert_eq!(tx.delete, vec![key]);
        assert_eq!(tx.operation_count(), 1);
    }

    #[test]
    fn test_duplicate_annotation_flags_fail_validation() {
        let mut content = content();
        content.string_annotations.push(StringAnnotation::new("foo", "baz"));

        let tx = storage_transaction(EntityCommands::Create { content });
        assert!(tx.validate().is_err());
    }
}
