//! Resolved resource model: descriptors validated and flattened for runtime use.

use crate::config::{ColumnType, DeleteKeyConfig, LookupConfig, RequiredField, UpdateConfig};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ResolvedColumn {
    pub name: String,
    pub ty: ColumnType,
    /// Stripped from every API response.
    pub sensitive: bool,
    /// Replaced by its bcrypt hash before any write.
    pub hashed: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub path: String,
    pub table: String,
    pub label: String,
    pub id_column: String,
    /// Writable columns in declaration order. Excludes the id column.
    pub columns: Vec<ResolvedColumn>,
    pub required: Vec<RequiredField>,
    pub delete_key: DeleteKeyConfig,
    pub update: UpdateConfig,
    pub batch_create_ids: bool,
    pub lookups: Vec<LookupConfig>,
    pub defaults: Map<String, Value>,
}

impl ResolvedResource {
    pub fn column(&self, name: &str) -> Option<&ResolvedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Type of `name`; the id column is always an integer.
    pub fn column_type(&self, name: &str) -> ColumnType {
        if name == self.id_column {
            return ColumnType::Integer;
        }
        self.column(name).map(|c| c.ty).unwrap_or_default()
    }

    /// Lookups joined into a list row (`list`) or a single-row read.
    pub fn read_lookups(&self, list: bool) -> impl Iterator<Item = &LookupConfig> {
        self.lookups.iter().filter(move |l| list || !l.list_only)
    }

    /// Columns returned by reads.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ResolvedColumn> {
        self.columns.iter().filter(|c| !c.sensitive)
    }

    /// Label with its first letter upper-cased, for messages that open with it.
    pub fn title(&self) -> String {
        let mut chars = self.label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Remove sensitive columns from a response object.
    pub fn strip_sensitive(&self, object: &mut Map<String, Value>) {
        for c in self.columns.iter().filter(|c| c.sensitive) {
            object.remove(&c.name);
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub resources: Vec<Arc<ResolvedResource>>,
    pub by_path: HashMap<String, Arc<ResolvedResource>>,
}

impl ResolvedModel {
    pub fn resource(&self, path: &str) -> Option<&Arc<ResolvedResource>> {
        self.by_path.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve};

    fn tempering() -> Arc<ResolvedResource> {
        let model = resolve(
            &load_from_str(
                r#"[{"path":"table/tempering-aasted","table":"tempering_aasted","label":"tempering aasted",
                     "columns":[{"name":"id_form","type":"integer"},{"name":"secret"}],
                     "sensitive_columns":["secret"]}]"#,
            )
            .unwrap(),
        )
        .unwrap();
        Arc::clone(model.resource("table/tempering-aasted").unwrap())
    }

    #[test]
    fn title_capitalizes_first_letter_only() {
        assert_eq!(tempering().title(), "Tempering aasted");
    }

    #[test]
    fn strip_sensitive_removes_only_flagged_columns() {
        let mut row = serde_json::json!({"id": 1, "id_form": 3, "secret": "x"})
            .as_object()
            .unwrap()
            .clone();
        tempering().strip_sensitive(&mut row);
        assert!(row.contains_key("id_form"));
        assert!(!row.contains_key("secret"));
    }

    #[test]
    fn column_type_falls_back_to_text() {
        let r = tempering();
        assert_eq!(r.column_type("id_form"), ColumnType::Integer);
        assert_eq!(r.column_type("unknown"), ColumnType::Text);
    }
}
