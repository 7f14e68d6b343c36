//! Config command: show or change settings.

use super::Output;
use aidb_core::{Config, CONFIG_KEYS};
use anyhow::{Context, Result};
use console::style;
use serde_json::{Map, Value};

/// Show all settings, read one key, or write one key.
pub fn run(out: &Output, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let path = Config::default_path()?;
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    match (key, value) {
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config
                .save(&path)
                .with_context(|| format!("Failed to save config to {}", path.display()))?;
            if out.verbose() {
                println!("{} {} = {}", style("✓").green(), key, value);
            }
        }
        (Some(key), None) => {
            let current = config.get(key)?;
            if out.json {
                let mut values = Map::new();
                values.insert(
                    key.to_string(),
                    current.map(Value::String).unwrap_or(Value::Null),
                );
                out.print_json(&Value::Object(values))?;
            } else if let Some(current) = current {
                println!("{}", current);
            }
        }
        _ => {
            let mut values = Map::new();
            for key in CONFIG_KEYS {
                values.insert(
                    key.to_string(),
                    config.get(key)?.map(Value::String).unwrap_or(Value::Null),
                );
            }
            if out.json {
                out.print_json(&Value::Object(values))?;
            } else {
                println!("{}", style(path.display()).dim());
                for (key, value) in &values {
                    let shown = value.as_str().unwrap_or("(unset)");
                    println!("  {} = {}", style(key).cyan(), shown);
                }
                let root = config.storage_root()?;
                println!("  {} {}", style("effective root:").dim(), root.path().display());
            }
        }
    }

    Ok(())
}
