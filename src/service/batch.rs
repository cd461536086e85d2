//! Transactional batch writer used by every update.
//!
//! One call owns one transaction: the payload is validated on the open
//! transaction, each record is written with only the fields it carries, and
//! the first record that matches no row or fails aborts the whole call.
//! Every path ends in exactly one commit or rollback, and the connection goes
//! back to the pool when the transaction handle is consumed.

use crate::config::ResolvedResource;
use crate::error::{AppError, HashError, StoreError};
use crate::password;
use crate::service::{is_truthy, messages};
use crate::store::{key_of, Row, Store, StoreTx};
use axum::http::StatusCode;
use serde_json::Value;

/// Outcome of an update: the echoed payload, the record count and, for a
/// single object, its key.
pub struct Updated {
    pub data: Value,
    pub count: usize,
    pub single_key: Option<i64>,
}

enum WriteFailure {
    InvalidInput,
    NotFound(i64),
    Store(StoreError),
    Hash(HashError),
}

pub struct BatchWriter;

impl BatchWriter {
    /// `PUT /`: a single object or a non-empty array, each keyed by the resource's update key.
    pub async fn update(store: &dyn Store, resource: &ResolvedResource, payload: Value) -> Result<Updated, AppError> {
        Self::run(store, resource, payload, None).await
    }

    /// `PUT /:id`: one record keyed by the path, restricted to the resource's path columns.
    pub async fn update_by_id(
        store: &dyn Store,
        resource: &ResolvedResource,
        id: &str,
        body: Value,
    ) -> Result<Updated, AppError> {
        let mut fields = match &body {
            Value::Object(fields) if !fields.is_empty() => fields.clone(),
            _ => return Err(AppError::Validation(messages::EMPTY_BODY.into())),
        };
        let allowed: Vec<String> = match &resource.update.path_columns {
            Some(columns) => columns.clone(),
            None => resource.columns.iter().map(|c| c.name.clone()).collect(),
        };
        let key = &resource.update.key;
        fields.retain(|name, _| name != key && allowed.contains(name));
        if fields.is_empty() {
            return Err(AppError::Validation(messages::NO_UPDATABLE_FIELDS.into()));
        }
        fields.insert(key.clone(), Value::String(id.to_string()));
        let mut updated = Self::run(store, resource, Value::Object(fields), Some(allowed.as_slice())).await?;
        // the response echoes the body as sent, not the filtered write
        updated.data = Self::echo(resource, body);
        Ok(updated)
    }

    async fn run(
        store: &dyn Store,
        resource: &ResolvedResource,
        payload: Value,
        allowed: Option<&[String]>,
    ) -> Result<Updated, AppError> {
        let mut tx = store
            .begin()
            .await
            .map_err(|e| Self::failure(resource, WriteFailure::Store(e)))?;
        tracing::debug!(resource = %resource.path, "transaction open");

        match Self::write_all(tx.as_mut(), resource, &payload, allowed).await {
            Ok(keys) => {
                tx.commit()
                    .await
                    .map_err(|e| Self::failure(resource, WriteFailure::Store(e)))?;
                tracing::debug!(resource = %resource.path, records = keys.len(), "transaction committed");
                let single_key = if payload.is_object() { keys.first().copied() } else { None };
                Ok(Updated {
                    data: Self::echo(resource, payload),
                    count: keys.len(),
                    single_key,
                })
            }
            Err(failure) => {
                if let Err(e) = tx.rollback().await {
                    tracing::error!(resource = %resource.path, error = %e, "rollback failed");
                } else {
                    tracing::debug!(resource = %resource.path, "transaction rolled back");
                }
                Err(Self::failure(resource, failure))
            }
        }
    }

    /// Validate every record, then write them in order. Returns the written keys.
    async fn write_all(
        tx: &mut dyn StoreTx,
        resource: &ResolvedResource,
        payload: &Value,
        allowed: Option<&[String]>,
    ) -> Result<Vec<i64>, WriteFailure> {
        let items: Vec<&Row> = match payload {
            Value::Object(obj) => vec![obj],
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(Value::as_object)
                .collect::<Option<_>>()
                .ok_or(WriteFailure::InvalidInput)?,
            _ => return Err(WriteFailure::InvalidInput),
        };

        let key_column = resource.update.key.as_str();
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let key = item
                .get(key_column)
                .filter(|v| is_truthy(v))
                .and_then(key_of)
                .ok_or(WriteFailure::InvalidInput)?;
            let has_required = resource
                .update
                .required
                .iter()
                .all(|f| item.get(f).map(is_truthy).unwrap_or(false));
            if !has_required {
                return Err(WriteFailure::InvalidInput);
            }
            keyed.push((key, item));
        }

        let mut keys = Vec::with_capacity(keyed.len());
        for (key, item) in keyed {
            let mut fields: Row = item
                .iter()
                .filter(|(name, _)| name.as_str() != key_column)
                .filter(|(name, _)| allowed.map_or(true, |a| a.iter().any(|c| c == *name)))
                .map(|(name, v)| (name.clone(), v.clone()))
                .collect();
            password::hash_columns(resource, &mut fields)
                .await
                .map_err(WriteFailure::Hash)?;
            let affected = tx
                .update(resource, key_column, key, &fields)
                .await
                .map_err(WriteFailure::Store)?;
            if affected == 0 {
                return Err(WriteFailure::NotFound(key));
            }
            keys.push(key);
        }
        Ok(keys)
    }

    fn echo(resource: &ResolvedResource, payload: Value) -> Value {
        match payload {
            Value::Object(mut obj) => {
                resource.strip_sensitive(&mut obj);
                Value::Object(obj)
            }
            Value::Array(items) => Value::Array(items.into_iter().map(|v| Self::echo(resource, v)).collect()),
            other => other,
        }
    }

    fn failure(resource: &ResolvedResource, failure: WriteFailure) -> AppError {
        let status = StatusCode::from_u16(resource.update.failure_status).unwrap_or(StatusCode::BAD_REQUEST);
        let rolled_back = |cause: String| AppError::Rejected {
            status,
            message: messages::UPDATE_ROLLED_BACK.into(),
            cause,
        };
        match failure {
            WriteFailure::InvalidInput => AppError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: messages::invalid_update(&resource.update.key),
                cause: "Invalid input data".into(),
            },
            WriteFailure::NotFound(_) if resource.update.not_found_as_failure => rolled_back("Not Found".into()),
            WriteFailure::NotFound(key) => AppError::Rejected {
                status: StatusCode::NOT_FOUND,
                message: messages::not_found(resource, key),
                cause: "Not found".into(),
            },
            WriteFailure::Store(e) => rolled_back(e.to_string()),
            WriteFailure::Hash(e) => rolled_back(e.to_string()),
        }
    }
}
