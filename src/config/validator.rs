//! Descriptor validation: identifiers, routes and column references.

use crate::config::ResourceConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";
const PATH_PATTERN: &str = r"^[a-z0-9-]+(/[a-z0-9-]+)*$";

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::Validation(format!("invalid pattern {}: {}", pattern, e)))
}

pub fn validate(resources: &[ResourceConfig]) -> Result<(), ConfigError> {
    if resources.is_empty() {
        return Err(ConfigError::Validation("at least one resource required".into()));
    }
    let identifier_re = compile(IDENTIFIER_PATTERN)?;
    let path_re = compile(PATH_PATTERN)?;
    let check_identifier = |name: &str| {
        if identifier_re.is_match(name) {
            Ok(())
        } else {
            Err(ConfigError::InvalidIdentifier(name.to_string()))
        }
    };

    let mut paths = HashSet::new();
    for r in resources {
        if !path_re.is_match(&r.path) {
            return Err(ConfigError::Validation(format!("invalid route path '{}'", r.path)));
        }
        if !paths.insert(r.path.as_str()) {
            return Err(ConfigError::DuplicatePath(r.path.clone()));
        }
        if r.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!("resource '{}' has an empty label", r.path)));
        }
        check_identifier(&r.table)?;
        check_identifier(&r.id_column)?;

        if r.columns.is_empty() {
            return Err(ConfigError::Validation(format!("resource '{}' declares no columns", r.path)));
        }
        let mut columns = HashSet::new();
        for c in &r.columns {
            check_identifier(&c.name)?;
            if c.name == r.id_column {
                return Err(ConfigError::Validation(format!(
                    "resource '{}' lists id column '{}' as a writable column",
                    r.path, c.name
                )));
            }
            if !columns.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "resource '{}' declares column '{}' twice",
                    r.path, c.name
                )));
            }
        }
        let known = |name: &str| name == r.id_column || columns.contains(name);
        let missing = |kind: &'static str, name: &str| ConfigError::MissingReference {
            resource: r.path.clone(),
            kind,
            name: name.to_string(),
        };

        for req in &r.required {
            if !columns.contains(req.field.as_str()) {
                return Err(missing("required field", &req.field));
            }
        }
        if !known(&r.delete_key.column) {
            return Err(missing("delete column", &r.delete_key.column));
        }
        check_identifier(&r.delete_key.field)?;
        if !known(&r.update.key) {
            return Err(missing("update key", &r.update.key));
        }
        if !(400..=599).contains(&r.update.failure_status) {
            return Err(ConfigError::Validation(format!(
                "resource '{}' has failure_status {} outside 400-599",
                r.path, r.update.failure_status
            )));
        }
        for name in r
            .update
            .required
            .iter()
            .chain(r.update.path_columns.iter().flatten())
            .chain(&r.sensitive_columns)
            .chain(&r.hashed_columns)
            .chain(r.defaults.keys())
        {
            if !columns.contains(name.as_str()) {
                return Err(missing("column", name));
            }
        }
        for lookup in &r.lookups {
            if !columns.contains(lookup.column.as_str()) {
                return Err(missing("lookup column", &lookup.column));
            }
            check_identifier(&lookup.table)?;
            check_identifier(&lookup.select)?;
            check_identifier(&lookup.alias)?;
        }
    }
    Ok(())
}
