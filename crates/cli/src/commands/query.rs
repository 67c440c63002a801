use anyhow::{Context, Result};
use golembase_client::{AlloyNode, ClientConfig, SearchResult, StorageNode};

pub async fn handle_query(config: &ClientConfig, query: &str) -> Result<()> {
    let node = AlloyNode::connect(&config.node_url)?;
    let results = node
        .query_entities(query)
        .await
        .with_context(|| format!("Query '{}' failed", query))?;

    if results.is_empty() {
        println!("No entities match '{}'", query);
        return Ok(());
    }

    println!("Found {} entities matching '{}'", results.len(), query);
    for result in &results {
        println!("{}", format_result(result));
    }

    Ok(())
}

fn format_result(result: &SearchResult) -> String {
    format!("  {}  {}", result.key, String::from_utf8_lossy(&result.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use golembase_storagetx::{Bytes, EntityKey};

    #[test]
    fn test_format_result() {
        let result = SearchResult {
            key: EntityKey::repeat_byte(0xab),
            value: Bytes::from_static(b"hello"),
        };
        let line = format_result(&result);
        assert!(line.contains("0xabababab"));
        assert!(line.ends_with("hello"));
    }

    #[test]
    fn test_format_binary_payload() {
        let result = SearchResult {
            key: EntityKey::ZERO,
            value: Bytes::from_static(&[0xff, 0x41]),
        };
        assert!(format_result(&result).ends_with("\u{fffd}A"));
    }
}
