use crate::utils::env_paths::EnvPaths;
use anyhow::{anyhow, Result};
use api::config::{load_definitions, ConfigurationDefinition};
use colored::*;
use serde_yaml::Value;
use std::collections::BTreeMap;

fn load_sections() -> Result<BTreeMap<String, ConfigurationDefinition>> {
    let env_paths = EnvPaths::load()?;
    let definitions = load_definitions(&env_paths.configuration_path)
        .map_err(|e| anyhow!("Failed to load configurations: {}", e))?;
    Ok(definitions
        .into_iter()
        .map(|definition| (definition.id.clone(), definition))
        .collect())
}

/// List all loaded configurations
pub fn list(format: String) -> Result<()> {
    let sections = load_sections()?;
    let values: BTreeMap<&str, &BTreeMap<String, Value>> = sections
        .iter()
        .map(|(id, definition)| (id.as_str(), &definition.values))
        .collect();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&values)?),
        "yaml" => println!("{}", serde_yaml::to_string(&values)?),
        _ => print_configs_text(&sections),
    }

    Ok(())
}

/// Get a specific configuration value, e.g. `api.pagination.todos.first_max`
pub fn get(section: String, format: String) -> Result<()> {
    let sections = load_sections()?;
    let parts: Vec<&str> = section.split('.').collect();
    let value = navigate_config_path(&sections, &parts)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&value)?),
        "yaml" => println!("{}", serde_yaml::to_string(&value)?),
        _ => print_config_value(&section, &value),
    }

    Ok(())
}

/// The first path segment names the configuration, the rest is a path into
/// its values.
fn navigate_config_path(
    sections: &BTreeMap<String, ConfigurationDefinition>,
    path: &[&str],
) -> Result<Value> {
    let (section, rest) = path
        .split_first()
        .ok_or_else(|| anyhow!("Empty configuration path"))?;
    let definition = sections
        .get(*section)
        .ok_or_else(|| anyhow!("Configuration section '{}' not found", section))?;

    if rest.is_empty() {
        return serde_yaml::to_value(&definition.values).map_err(Into::into);
    }

    definition
        .get_nested(&rest.join("."))
        .cloned()
        .ok_or_else(|| anyhow!("Configuration key '{}' not found", path.join(".")))
}

fn print_configs_text(sections: &BTreeMap<String, ConfigurationDefinition>) {
    println!("{}", "=== Todo API Configuration ===".bold());
    println!();

    if sections.is_empty() {
        println!("{}", "No configurations loaded".yellow());
        return;
    }

    for (id, definition) in sections {
        println!(
            "{} {}",
            format!("[{}]", id).cyan().bold(),
            definition.name.dimmed()
        );
        for (key, value) in &definition.values {
            print!("  {}: ", key.cyan());
            print_inline_or_nested(value, 1);
        }
        println!();
    }

    println!("{}", format!("Total sections: {}", sections.len()).green());
}

fn print_config_value(path: &str, value: &Value) {
    println!("{}", "=== Configuration Value ===".bold());
    println!();
    println!("{}: {}", "Path".bold(), path.cyan());
    println!("{}: {}", "Type".bold(), value_type_name(value).yellow());
    println!();
    println!("{}:", "Value".bold());
    print_yaml_value(value, 0);
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "array",
        Value::Mapping(_) => "object",
        Value::Tagged(_) => "tagged",
    }
}

/// Scalars stay on the current line, collections start a nested block.
fn print_inline_or_nested(value: &Value, indent_level: usize) {
    match value {
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            println!();
            print_yaml_value(value, indent_level + 1);
        }
        _ => print_yaml_value(value, 0),
    }
}

fn print_yaml_value(value: &Value, indent_level: usize) {
    let indent = "  ".repeat(indent_level);

    match value {
        Value::Null => println!("{}null", indent),
        Value::Bool(b) => println!("{}{}", indent, b.to_string().blue()),
        Value::Number(n) => println!("{}{}", indent, n.to_string().magenta()),
        Value::String(s) if s.contains('/') || s.contains('\\') => {
            println!("{}{}", indent, s.green())
        }
        Value::String(s) => println!("{}{}", indent, s.yellow()),
        Value::Sequence(seq) => {
            for item in seq {
                println!("{}- ", indent);
                print_yaml_value(item, indent_level + 1);
            }
        }
        Value::Mapping(map) => {
            for (key, val) in map {
                match key {
                    Value::String(key) => print!("{}{}: ", indent, key.cyan()),
                    other => print!("{}{:?}: ", indent, other),
                }
                print_inline_or_nested(val, indent_level);
            }
        }
        Value::Tagged(tagged) => {
            println!("{}!{} ", indent, tagged.tag);
            print_yaml_value(&tagged.value, indent_level + 1);
        }
    }
}
