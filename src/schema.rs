//! Optional schema bootstrap: create the database and one table per resource.
//! Existing tables are left untouched.

use crate::config::{ResolvedModel, ResolvedResource};
use crate::error::StoreError;
use crate::sql::quoted;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// `CREATE TABLE IF NOT EXISTS` for one resource, with a serial id.
pub fn create_table_sql(resource: &ResolvedResource) -> String {
    let mut cols = vec![format!("{} SERIAL PRIMARY KEY", quoted(&resource.id_column))];
    for c in &resource.columns {
        cols.push(format!("{} {}", quoted(&c.name), c.ty.pg_name()));
    }
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted(&resource.table), cols.join(", "))
}

pub async fn ensure_tables(pool: &PgPool, model: &ResolvedModel) -> Result<(), StoreError> {
    for resource in &model.resources {
        let sql = create_table_sql(resource);
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(tables = model.resources.len(), "resource tables ensured");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Backend("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
