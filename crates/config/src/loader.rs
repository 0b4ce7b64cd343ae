use std::{path::Path, str::FromStr};

use anyhow::bail;
use indoc::indoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use std::fmt::Write;
use toml::Value;

use crate::Config;

/// Check if a configuration path represents an optional environment variable field
fn is_optional_env_field(path: &str) -> bool {
    let parts: Vec<&str> = path.split('.').collect();

    // logins.<provider>.access_token
    matches!(parts.as_slice(), ["logins", _, "access_token"])
}

/// Extract the path from an error message like "Failed to expand dynamic string at path 'path': error"
fn extract_path_from_error(error_message: &str) -> Option<String> {
    let start = error_message.find("path '")? + 6;
    let end = error_message[start..].find("':")?;

    Some(error_message[start..start + end].to_string())
}

/// Remove a field from the TOML configuration by path
fn remove_field_from_config(config: &mut Value, path: &str) -> bool {
    let parts: Vec<&str> = path.split('.').collect();

    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut current = config;

    for part in parents {
        match current.as_table_mut().and_then(|table| table.get_mut(*part)) {
            Some(value) => current = value,
            None => return false,
        }
    }

    let removed = current
        .as_table_mut()
        .map(|table| table.remove(*last).is_some())
        .unwrap_or(false);

    if removed {
        log::debug!("Removed optional field '{path}', its environment variable could not be expanded");
    }

    removed
}

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref().to_path_buf();
    let content = std::fs::read_to_string(&path)?;

    parse(&content)
}

pub(crate) fn parse(content: &str) -> anyhow::Result<Config> {
    let mut raw_config: Value = toml::from_str(content)?;

    // Optional fields that fail to expand are dropped one by one until expansion succeeds.
    loop {
        let Err(err) = expand_dynamic_strings(&mut Vec::new(), &mut raw_config) else {
            break;
        };

        let err_str = err.to_string();

        let Some(field) = extract_path_from_error(&err_str) else {
            return Err(err);
        };

        if !is_optional_env_field(&field) {
            return Err(err);
        }

        if !remove_field_from_config(&mut raw_config, &field) {
            return Err(err);
        }
    }

    let config = Config::deserialize(raw_config)?;

    for warning in validate(&config) {
        log::warn!("{warning}");
    }

    Ok(config)
}

/// Validates the identity configuration and returns warnings.
///
/// An empty pool id is not an error here: clients reject it when they initialize.
pub(crate) fn validate(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.identity.pool_id.is_empty() {
        warnings.push(
            indoc! {r#"
                No identity pool configured. Logins will fail until one is set, for example:

                  [identity]
                  pool_id = "us-east-1:00000000-0000-0000-0000-000000000000"
                  region = "us-east-1"
            "#}
            .trim_end()
            .to_string(),
        );
    }

    for (provider, login) in &config.logins {
        if login.access_token.is_none() {
            warnings.push(format!(
                "No access token configured for login provider '{provider}', it must be given on the command line"
            ));
        }
    }

    warnings
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                // Build the path string for error reporting and optional field detection
                let mut p = String::new();
                for segment in path {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]")?,
                    }
                }
                if p.ends_with('.') {
                    p.pop();
                }

                bail!("Failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
