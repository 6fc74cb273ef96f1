//! `${VAR}` and `${VAR:-default}` expansion for theme values.

use toml::{Table, Value};

use crate::ConfigError;

/// Expand environment references in one string.
///
/// Only the braced forms are expanded; a string without `${` is returned as is,
/// so literal `$` characters survive.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand every string in `table`, including strings inside arrays.
///
/// Field names in errors are `{section}.{key}` (with `[i]` for array items).
pub(crate) fn expand_table(table: &mut Table, section: &str) -> Result<(), ConfigError> {
    for (key, value) in table.iter_mut() {
        expand_value(value, &format!("{section}.{key}"))?;
    }
    Ok(())
}

fn expand_value(value: &mut Value, field: &str) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => *s = expand_env(s, field)?,
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                expand_value(item, &format!("{field}[{index}]"))?;
            }
        }
        Value::Table(table) => expand_table(table, field)?,
        _ => {}
    }
    Ok(())
}

struct UnsetVar(String);
