//! In-memory store for tests. Mirrors the PostgreSQL store's observable
//! behaviour and counts connection and transaction events so tests can
//! assert the batch writer's cleanup guarantees.

use crate::config::ResolvedResource;
use crate::error::StoreError;
use crate::store::{key_of, Row, Store, StoreResult, StoreTx};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Table = BTreeMap<i64, Row>;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Table>,
    next_id: HashMap<String, i64>,
}

impl Tables {
    fn table(&self, name: &str) -> Option<&Table> {
        self.rows.get(name)
    }

    fn insert(&mut self, name: &str, mut row: Row, id_column: &str) -> i64 {
        let next = self.next_id.entry(name.to_string()).or_insert(1);
        let id = *next;
        *next += 1;
        row.insert(id_column.to_string(), Value::from(id));
        self.rows.entry(name.to_string()).or_default().insert(id, row);
        id
    }
}

#[derive(Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    /// Statements that reached the store, transactional or not.
    pub statements: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    counters: Arc<Counters>,
    failing_updates: Arc<Mutex<HashSet<(String, i64)>>>,
    down: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Make every transactional update of `key` in `table` fail with a store error.
    pub fn fail_update_of(&self, table: &str, key: i64) {
        self.failing_updates
            .lock()
            .expect("failure set lock")
            .insert((table.to_string(), key));
    }

    /// Simulate a lost database: every operation errors.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Insert a row directly, bypassing the counters. Returns its id.
    pub fn seed(&self, resource: &ResolvedResource, row: Value) -> i64 {
        let row = row.as_object().cloned().unwrap_or_default();
        self.lock().insert(&resource.table, row, &resource.id_column)
    }

    /// Raw stored row, including sensitive columns.
    pub fn raw(&self, table: &str, id: i64) -> Option<Row> {
        self.lock().table(table).and_then(|t| t.get(&id)).cloned()
    }

    pub fn len(&self, table: &str) -> usize {
        self.lock().table(table).map(|t| t.len()).unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock")
    }

    fn check_up(&self) -> StoreResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Backend("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn statement(&self) -> StoreResult<()> {
        self.check_up()?;
        self.counters.statements.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Read projection matching the SQL one: id, visible columns, lookups as text.
fn project(tables: &Tables, resource: &ResolvedResource, row: &Row, list: bool) -> Row {
    let mut out = Row::new();
    out.insert(
        resource.id_column.clone(),
        row.get(&resource.id_column).cloned().unwrap_or(Value::Null),
    );
    for c in resource.visible_columns() {
        out.insert(c.name.clone(), row.get(&c.name).cloned().unwrap_or(Value::Null));
    }
    for l in resource.read_lookups(list) {
        let value = row
            .get(&l.column)
            .and_then(key_of)
            .and_then(|id| tables.table(&l.table).and_then(|t| t.get(&id)))
            .and_then(|target| target.get(&l.select))
            .map(|v| match v {
                Value::String(s) => Value::String(s.clone()),
                Value::Null => Value::Null,
                other => Value::String(other.to_string()),
            })
            .unwrap_or(Value::Null);
        out.insert(l.alias.clone(), value);
    }
    out
}

fn matches(row: &Row, column: &str, key: i64) -> bool {
    row.get(column).and_then(key_of) == Some(key)
}

#[async_trait]
impl Store for MemoryStore {
    async fn list(&self, resource: &ResolvedResource) -> StoreResult<Vec<Row>> {
        self.statement()?;
        let tables = self.lock();
        Ok(tables
            .table(&resource.table)
            .map(|t| t.values().map(|r| project(&tables, resource, r, true)).collect())
            .unwrap_or_default())
    }

    async fn get(&self, resource: &ResolvedResource, id: i64) -> StoreResult<Option<Row>> {
        self.statement()?;
        let tables = self.lock();
        Ok(tables
            .table(&resource.table)
            .and_then(|t| t.get(&id))
            .map(|r| project(&tables, resource, r, false)))
    }

    async fn insert(&self, resource: &ResolvedResource, rows: &[Row]) -> StoreResult<Vec<i64>> {
        self.statement()?;
        let mut tables = self.lock();
        let ids: Vec<i64> = rows
            .iter()
            .map(|row| {
                let stored: Row = resource
                    .columns
                    .iter()
                    .map(|c| (c.name.clone(), row.get(&c.name).cloned().unwrap_or(Value::Null)))
                    .collect();
                tables.insert(&resource.table, stored, &resource.id_column)
            })
            .collect();
        Ok(ids)
    }

    async fn delete_in(&self, resource: &ResolvedResource, column: &str, ids: &[i64]) -> StoreResult<u64> {
        self.statement()?;
        let mut tables = self.lock();
        let Some(table) = tables.rows.get_mut(&resource.table) else {
            return Ok(0);
        };
        let before = table.len();
        table.retain(|_, row| !ids.iter().any(|id| matches(row, column, *id)));
        Ok((before - table.len()) as u64)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        self.check_up()?;
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        let snapshot = self
            .lock()
            .rows
            .iter()
            .map(|(name, table)| (name.clone(), table.clone()))
            .collect();
        Ok(Box::new(MemoryTx {
            store: self.clone(),
            working: snapshot,
            staged: Vec::new(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_up()
    }
}

/// One row update waiting for commit.
struct StagedUpdate {
    table: String,
    columns: Vec<String>,
    key_column: String,
    key: i64,
    fields: Row,
}

/// Set `fields` on every row whose `key_column` equals `key`. Returns the rows matched.
fn apply_update(table: &mut Table, columns: &[String], key_column: &str, key: i64, fields: &Row) -> u64 {
    let mut affected = 0;
    for row in table.values_mut().filter(|row| matches(row, key_column, key)) {
        for name in columns.iter().filter(|c| c.as_str() != key_column) {
            if let Some(v) = fields.get(name) {
                row.insert(name.clone(), v.clone());
            }
        }
        affected += 1;
    }
    affected
}

/// Updates run against a private snapshot so the transaction sees its own
/// writes; commit replays them onto the live tables, leaving rows written
/// outside the transaction in place.
pub struct MemoryTx {
    store: MemoryStore,
    working: HashMap<String, Table>,
    staged: Vec<StagedUpdate>,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn update(
        &mut self,
        resource: &ResolvedResource,
        key_column: &str,
        key: i64,
        fields: &Row,
    ) -> StoreResult<u64> {
        self.store.statement()?;
        let failing = self
            .store
            .failing_updates
            .lock()
            .expect("failure set lock")
            .contains(&(resource.table.clone(), key));
        if failing {
            return Err(StoreError::Backend(format!(
                "simulated failure updating {} {}",
                resource.table, key
            )));
        }
        let Some(table) = self.working.get_mut(&resource.table) else {
            return Ok(0);
        };
        let columns: Vec<String> = resource.columns.iter().map(|c| c.name.clone()).collect();
        let affected = apply_update(table, &columns, key_column, key, fields);
        if affected > 0 {
            self.staged.push(StagedUpdate {
                table: resource.table.clone(),
                columns,
                key_column: key_column.to_string(),
                key,
                fields: fields.clone(),
            });
        }
        Ok(affected)
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.store.check_up()?;
        let mut tables = self.store.lock();
        for u in self.staged.drain(..) {
            if let Some(table) = tables.rows.get_mut(&u.table) {
                apply_update(table, &u.columns, &u.key_column, u.key, &u.fields);
            }
        }
        drop(tables);
        self.store.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.store.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        self.store.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve, BUNDLED_RESOURCES};
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn commit_keeps_rows_written_outside_the_transaction() {
        let model = resolve(&load_from_str(BUNDLED_RESOURCES).unwrap()).unwrap();
        let dept = model.resource("department").unwrap();
        let store = MemoryStore::new();
        store.seed(dept, json!({"name": "A"}));
        store.seed(dept, json!({"name": "C"}));

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.update(dept, "id", 1, &row(json!({"name": "A2"}))).await.unwrap(), 1);
        let ids = store.insert(dept, &[row(json!({"name": "B"}))]).await.unwrap();
        assert_eq!(store.delete_in(dept, "id", &[2]).await.unwrap(), 1);
        tx.commit().await.unwrap();

        assert_eq!(store.raw("department", 1).unwrap()["name"], "A2");
        assert_eq!(store.raw("department", ids[0]).unwrap()["name"], "B");
        assert!(store.raw("department", 2).is_none());
        assert_eq!(store.len("department"), 2);
    }

    #[tokio::test]
    async fn rollback_discards_staged_updates() {
        let model = resolve(&load_from_str(BUNDLED_RESOURCES).unwrap()).unwrap();
        let dept = model.resource("department").unwrap();
        let store = MemoryStore::new();
        store.seed(dept, json!({"name": "A"}));

        let mut tx = store.begin().await.unwrap();
        tx.update(dept, "id", 1, &row(json!({"name": "A2"}))).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.raw("department", 1).unwrap()["name"], "A");
        assert_eq!(store.counters().released.load(Ordering::SeqCst), 1);
    }
}
