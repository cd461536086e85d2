//! Record store abstraction.
//!
//! Simple operations run straight against the pool. Updates go through a
//! [`StoreTx`], which owns one pooled connection for its whole life: it is
//! released when the transaction is committed, rolled back or dropped.

use crate::config::ResolvedResource;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

pub type Row = Map<String, Value>;
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// All rows of the resource ordered by id, sensitive columns excluded.
    async fn list(&self, resource: &ResolvedResource) -> StoreResult<Vec<Row>>;

    async fn get(&self, resource: &ResolvedResource, id: i64) -> StoreResult<Option<Row>>;

    /// Insert every row in one statement; returns the generated ids in row order.
    async fn insert(&self, resource: &ResolvedResource, rows: &[Row]) -> StoreResult<Vec<i64>>;

    /// Delete rows whose `column` is one of `ids`; returns the affected-row count.
    async fn delete_in(&self, resource: &ResolvedResource, column: &str, ids: &[i64]) -> StoreResult<u64>;

    /// Acquire a dedicated connection and open a transaction on it.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Partial update of the rows whose `key_column` equals `key`; returns the affected-row count.
    async fn update(
        &mut self,
        resource: &ResolvedResource,
        key_column: &str,
        key: i64,
        fields: &Row,
    ) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Integer key from a JSON number or numeric string.
pub fn key_of(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
