//! Load resource descriptors from the bundled table or from a JSON file.

use crate::config::resolved::{ResolvedColumn, ResolvedModel, ResolvedResource};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Descriptor table shipped with the binary.
pub const BUNDLED_RESOURCES: &str = include_str!("../../config/resources.json");

pub fn load_from_str(json: &str) -> Result<Vec<ResourceConfig>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_from_path(path: &Path) -> Result<Vec<ResourceConfig>, ConfigError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&json)
}

/// Load the descriptors from `path` when given, otherwise the bundled table, then resolve.
pub async fn load_model(path: Option<&Path>) -> Result<ResolvedModel, ConfigError> {
    let resources = match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading resource descriptors");
            load_from_path(p).await?
        }
        None => load_from_str(BUNDLED_RESOURCES)?,
    };
    resolve(&resources)
}

/// Build resolved model from descriptors (validates first).
pub fn resolve(resources: &[ResourceConfig]) -> Result<ResolvedModel, ConfigError> {
    validate(resources)?;

    let mut list = Vec::with_capacity(resources.len());
    let mut by_path = HashMap::new();
    for r in resources {
        let sensitive: HashSet<&str> = r.sensitive_columns.iter().map(String::as_str).collect();
        let hashed: HashSet<&str> = r.hashed_columns.iter().map(String::as_str).collect();
        let columns = r
            .columns
            .iter()
            .map(|c| ResolvedColumn {
                name: c.name.clone(),
                ty: c.type_,
                sensitive: sensitive.contains(c.name.as_str()),
                hashed: hashed.contains(c.name.as_str()),
            })
            .collect();
        let resource = Arc::new(ResolvedResource {
            path: r.path.clone(),
            table: r.table.clone(),
            label: r.label.clone(),
            id_column: r.id_column.clone(),
            columns,
            required: r.required.clone(),
            delete_key: r.delete_key.clone(),
            update: r.update.clone(),
            batch_create_ids: r.batch_create_ids,
            lookups: r.lookups.clone(),
            defaults: r.defaults.clone(),
        });
        by_path.insert(r.path.clone(), Arc::clone(&resource));
        list.push(resource);
    }
    tracing::debug!(resources = list.len(), "resource model resolved");
    Ok(ResolvedModel {
        resources: list,
        by_path,
    })
}
