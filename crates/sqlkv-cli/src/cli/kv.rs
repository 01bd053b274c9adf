//! Namespace key-value subcommands.
//!
//! Provides get, set, remove, keys and count on any `StoragePlugin`.
//! Values support arbitrary JSON (objects, arrays, strings, numbers, etc.).

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use sqlkv_core::storage::{Storage, StoragePlugin};
use sqlkv_types::storage::Entry;

/// Longest value preview shown in the `keys` table.
const PREVIEW_CHARS: usize = 60;

/// Parse a command-line value as JSON, falling back to a JSON string.
///
/// `sqlkv set prefs name Alice` stores the string `"Alice"`, while
/// `sqlkv set prefs config '{"theme":"dark"}'` stores the parsed object.
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Compact single-line rendering of a value, truncated on a char boundary.
pub fn preview(value: &serde_json::Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() > PREVIEW_CHARS {
        let truncated: String = rendered.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{truncated}...")
    } else {
        rendered
    }
}

/// Set a key-value pair. Value is parsed as JSON.
pub async fn kv_set<P: StoragePlugin>(
    plugin: &P,
    namespace: &str,
    key: &str,
    raw_value: &str,
    json: bool,
) -> Result<()> {
    let store = plugin
        .open(namespace)
        .await
        .with_context(|| format!("failed to open namespace '{namespace}'"))?;
    let value = parse_value(raw_value);

    store
        .set(key, &value)
        .await
        .with_context(|| format!("failed to set '{key}' in '{namespace}'"))?;
    store.close().await?;

    if json {
        let result = serde_json::json!({
            "namespace": namespace,
            "key": key,
            "value": value,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Set '{}' in '{}'",
            style("ok").green(),
            style(key).cyan(),
            style(namespace).cyan(),
        );
        println!();
    }

    Ok(())
}

/// Get a value by key and pretty-print it.
pub async fn kv_get<P: StoragePlugin>(
    plugin: &P,
    namespace: &str,
    key: &str,
    json: bool,
) -> Result<()> {
    let store = plugin
        .open(namespace)
        .await
        .with_context(|| format!("failed to open namespace '{namespace}'"))?;

    let value = match store.get(key).await {
        Ok(value) => Some(value),
        Err(err) if err.is_not_found() => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{key}' from '{namespace}'"));
        }
    };
    store.close().await?;

    match value {
        Some(value) => {
            if json {
                let entry = Entry {
                    key: key.to_string(),
                    value,
                };
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!();
                println!(
                    "  {} = {}",
                    style(key).cyan().bold(),
                    style(serde_json::to_string_pretty(&value)?).white(),
                );
                println!();
            }
        }
        None => {
            if json {
                let result = serde_json::json!({
                    "key": key,
                    "value": null,
                    "namespace": namespace,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!();
                println!(
                    "  {} Key '{}' not found in '{}'",
                    style("i").blue().bold(),
                    style(key).cyan(),
                    style(namespace).cyan(),
                );
                println!();
            }
        }
    }

    Ok(())
}

/// Remove a key-value pair. Missing keys are an error.
pub async fn kv_remove<P: StoragePlugin>(
    plugin: &P,
    namespace: &str,
    key: &str,
    json: bool,
) -> Result<()> {
    let store = plugin
        .open(namespace)
        .await
        .with_context(|| format!("failed to open namespace '{namespace}'"))?;

    store
        .remove(key)
        .await
        .with_context(|| format!("failed to remove '{key}' from '{namespace}'"))?;
    store.close().await?;

    if json {
        let result = serde_json::json!({
            "removed": key,
            "namespace": namespace,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Removed key '{}' from '{}'",
            style("ok").green(),
            style(key).cyan(),
            style(namespace).cyan(),
        );
        println!();
    }

    Ok(())
}

/// List all keys in a namespace with a value preview.
pub async fn kv_keys<P: StoragePlugin>(plugin: &P, namespace: &str, json: bool) -> Result<()> {
    let store = plugin
        .open(namespace)
        .await
        .with_context(|| format!("failed to open namespace '{namespace}'"))?;

    let keys = store
        .keys()
        .await
        .with_context(|| format!("failed to list keys of '{namespace}'"))?;

    if json {
        store.close().await?;
        let result = serde_json::json!({
            "namespace": namespace,
            "keys": keys,
            "count": keys.len(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if keys.is_empty() {
        store.close().await?;
        println!();
        println!(
            "  {} No key-value pairs in '{}'.",
            style("i").blue().bold(),
            style(namespace).cyan(),
        );
        println!("     Set one with: sqlkv set {namespace} <key> <json-value>");
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  Keys in '{}' ({} entries)",
        style(namespace).cyan(),
        keys.len(),
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Value Preview").fg(Color::White),
    ]);

    for key in &keys {
        // A key removed by another writer since listing shows as an error row.
        let value_preview = match store.get(key).await {
            Ok(value) => preview(&value),
            Err(err) => {
                tracing::debug!(namespace, key = %key, error = %err, "value preview failed");
                "(error)".to_string()
            }
        };

        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(&value_preview).fg(Color::DarkGrey),
        ]);
    }
    store.close().await?;

    println!("{table}");
    println!();

    Ok(())
}

/// Print the number of entries in a namespace.
pub async fn kv_count<P: StoragePlugin>(plugin: &P, namespace: &str, json: bool) -> Result<()> {
    let store = plugin
        .open(namespace)
        .await
        .with_context(|| format!("failed to open namespace '{namespace}'"))?;

    let count = store
        .len()
        .await
        .with_context(|| format!("failed to count entries of '{namespace}'"))?;
    store.close().await?;

    if json {
        let result = serde_json::json!({
            "namespace": namespace,
            "count": count,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{count}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlkv_infra::memory::MemoryStorageProvider;

    #[test]
    fn test_parse_value_json() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("{\"theme\":\"dark\"}"), json!({"theme": "dark"}));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_value("null"), json!(null));
    }

    #[test]
    fn test_parse_value_falls_back_to_string() {
        assert_eq!(parse_value("Alice"), json!("Alice"));
        assert_eq!(parse_value("{broken"), json!("{broken"));
    }

    #[test]
    fn test_preview_truncates() {
        let short = json!("blue");
        assert_eq!(preview(&short), "\"blue\"");

        let long = json!("é".repeat(100));
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
    }

    #[tokio::test]
    async fn test_commands_against_memory_plugin() {
        let plugin = MemoryStorageProvider::new();

        kv_set(&plugin, "prefs", "color", "blue", false).await.unwrap();
        kv_get(&plugin, "prefs", "color", true).await.unwrap();
        kv_keys(&plugin, "prefs", false).await.unwrap();
        kv_count(&plugin, "prefs", true).await.unwrap();

        let store = plugin.open("prefs").await.unwrap();
        assert_eq!(store.get("color").await.unwrap(), json!("blue"));

        kv_remove(&plugin, "prefs", "color", false).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_an_error() {
        let plugin = MemoryStorageProvider::new();
        kv_get(&plugin, "prefs", "missing", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_an_error() {
        let plugin = MemoryStorageProvider::new();
        let err = kv_remove(&plugin, "prefs", "missing", true).await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
