//! Braced environment references in configuration strings.

use std::borrow::Cow;
use std::env::VarError;

use crate::ConfigError;

/// Expand every `${VAR}` and `${VAR:-default}` reference in `value`.
///
/// Text outside braced references, a bare `$name` included, is copied as is.
/// An unset variable without a default is an error naming `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(open) = rest.find("${") {
        let Some(close) = rest[open..].find('}').map(|offset| open + offset) else {
            break;
        };
        expanded.push_str(&rest[..open]);
        expanded.push_str(&expand_reference(&rest[open..=close], field)?);
        rest = &rest[close + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Expand a single `${...}` reference.
fn expand_reference(reference: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env_with_context(reference, |var| {
        std::env::var(var).map(Some)
    })
    .map(Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: match e.cause {
            VarError::NotPresent => format!("${{{}}} not set", e.var_name),
            VarError::NotUnicode(_) => format!("${{{}}} is not valid UTF-8", e.var_name),
        },
    })
}
