//! PostgreSQL store over a shared sqlx pool.

use crate::config::ResolvedResource;
use crate::error::StoreError;
use crate::sql::{delete_in, insert_many, select_by_id, select_list, update_by_key, QueryBuf};
use crate::store::{Row, Store, StoreResult, StoreTx};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Transaction};

/// Bind parameters allowed in one PostgreSQL statement.
const MAX_BIND_PARAMS: usize = u16::MAX as usize;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn bound(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

#[async_trait]
impl Store for PgStore {
    async fn list(&self, resource: &ResolvedResource) -> StoreResult<Vec<Row>> {
        let q = select_list(resource);
        let rows = bound(&q).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn get(&self, resource: &ResolvedResource, id: i64) -> StoreResult<Option<Row>> {
        let q = select_by_id(resource, id);
        let row = bound(&q).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn insert(&self, resource: &ResolvedResource, rows: &[Row]) -> StoreResult<Vec<i64>> {
        let q = insert_many(resource, rows);
        if q.params.len() > MAX_BIND_PARAMS {
            return Err(StoreError::Backend(format!(
                "insert of {} rows needs {} parameters, limit is {}",
                rows.len(),
                q.params.len(),
                MAX_BIND_PARAMS
            )));
        }
        let returned = bound(&q).fetch_all(&self.pool).await?;
        returned.iter().map(|r| id_of(r, &resource.id_column)).collect()
    }

    async fn delete_in(&self, resource: &ResolvedResource, column: &str, ids: &[i64]) -> StoreResult<u64> {
        let q = delete_in(resource, column, ids);
        let done = bound(&q).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction on a connection taken from the pool. Dropping it without
/// commit rolls back and returns the connection.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn update(
        &mut self,
        resource: &ResolvedResource,
        key_column: &str,
        key: i64,
        fields: &Row,
    ) -> StoreResult<u64> {
        let q = update_by_key(resource, key_column, key, fields);
        let done = bound(&q).execute(&mut *self.tx).await?;
        Ok(done.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn id_of(row: &PgRow, column: &str) -> StoreResult<i64> {
    use sqlx::Row as _;
    if let Ok(v) = row.try_get::<i64, _>(column) {
        return Ok(v);
    }
    Ok(row.try_get::<i32, _>(column).map(i64::from)?)
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column as _;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(t)) = row.try_get::<Option<chrono::NaiveTime>, _>(name) {
        return Value::String(t.format("%H:%M:%S").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
