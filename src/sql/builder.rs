//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resolved resource.
//!
//! Identifiers come only from validated descriptors; payload keys never reach
//! the SQL text except after matching a declared column.

use crate::config::{ColumnType, ResolvedResource};
use crate::sql::PgBindValue;
use serde_json::{Map, Value};

const MAIN_ALIAS: &str = "main";
const LOOKUP_ALIAS: &str = "lk";

/// Quote identifier for PostgreSQL (safe: only from config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a bind value and return its placeholder, cast to `ty`.
    fn push_param(&mut self, v: PgBindValue, ty: ColumnType) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), ty.pg_name())
    }
}

/// Read projection: id, visible columns (numeric as text so it decodes losslessly), then lookups.
fn projection(resource: &ResolvedResource, list: bool) -> String {
    let mut parts = vec![format!(
        "{}.{} AS {}",
        MAIN_ALIAS,
        quoted(&resource.id_column),
        quoted(&resource.id_column)
    )];
    for c in resource.visible_columns() {
        let q = quoted(&c.name);
        let expr = if c.ty == ColumnType::Numeric {
            format!("{}.{}::text", MAIN_ALIAS, q)
        } else {
            format!("{}.{}", MAIN_ALIAS, q)
        };
        parts.push(format!("{} AS {}", expr, q));
    }
    for l in resource.read_lookups(list) {
        parts.push(format!(
            "(SELECT {lk}.{sel}::text FROM {tbl} {lk} WHERE {lk}.\"id\" = {main}.{col} LIMIT 1) AS {alias}",
            lk = LOOKUP_ALIAS,
            sel = quoted(&l.select),
            tbl = quoted(&l.table),
            main = MAIN_ALIAS,
            col = quoted(&l.column),
            alias = quoted(&l.alias),
        ));
    }
    parts.join(", ")
}

/// Every row of the resource ordered by id.
pub fn select_list(resource: &ResolvedResource) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} {} ORDER BY {}.{}",
        projection(resource, true),
        quoted(&resource.table),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(&resource.id_column)
    );
    q
}

pub fn select_by_id(resource: &ResolvedResource, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(PgBindValue::key(id), ColumnType::Integer);
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = {}",
        projection(resource, false),
        quoted(&resource.table),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(&resource.id_column),
        ph
    );
    q
}

/// One multi-row INSERT over every declared column; absent values insert NULL.
pub fn insert_many(resource: &ResolvedResource, rows: &[Map<String, Value>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols: Vec<String> = resource.columns.iter().map(|c| quoted(&c.name)).collect();
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let placeholders: Vec<String> = resource
            .columns
            .iter()
            .map(|c| {
                let v = row.get(&c.name).unwrap_or(&Value::Null);
                q.push_param(PgBindValue::for_column(v, c.ty), c.ty)
            })
            .collect();
        tuples.push(format!("({})", placeholders.join(", ")));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES {} RETURNING {}",
        quoted(&resource.table),
        cols.join(", "),
        tuples.join(", "),
        quoted(&resource.id_column)
    );
    q
}

/// Partial UPDATE: only the declared columns present in `fields` are set.
/// With nothing to set the key is assigned to itself so the affected-row
/// count still reports whether the row exists.
pub fn update_by_key(
    resource: &ResolvedResource,
    key_column: &str,
    key: i64,
    fields: &Map<String, Value>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &resource.columns {
        if c.name == key_column {
            continue;
        }
        if let Some(v) = fields.get(&c.name) {
            let ph = q.push_param(PgBindValue::for_column(v, c.ty), c.ty);
            sets.push(format!("{} = {}", quoted(&c.name), ph));
        }
    }
    if sets.is_empty() {
        sets.push(format!("{} = {}", quoted(key_column), quoted(key_column)));
    }
    let ph = q.push_param(PgBindValue::key(key), resource.column_type(key_column));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(&resource.table),
        sets.join(", "),
        quoted(key_column),
        ph
    );
    q
}

pub fn delete_in(resource: &ResolvedResource, column: &str, ids: &[i64]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ty = resource.column_type(column);
    let placeholders: Vec<String> = ids.iter().map(|id| q.push_param(PgBindValue::key(*id), ty)).collect();
    q.sql = format!(
        "DELETE FROM {} WHERE {} IN ({})",
        quoted(&resource.table),
        quoted(column),
        placeholders.join(", ")
    );
    q
}
