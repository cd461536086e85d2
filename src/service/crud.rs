//! Non-transactional resource operations: list, get, create, delete.

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::password;
use crate::service::{is_truthy, messages, RequestValidator};
use crate::store::{key_of, Row, Store};
use serde_json::Value;

/// Outcome of a create: the echoed payload and whether it was an array.
pub struct Created {
    pub data: Value,
    pub batch: bool,
}

pub struct CrudService;

impl CrudService {
    pub async fn list(store: &dyn Store, resource: &ResolvedResource) -> Result<Vec<Row>, AppError> {
        store
            .list(resource)
            .await
            .map_err(|e| AppError::store(messages::SERVER_ERROR, e))
    }

    /// Fetch one row. A non-numeric id cannot match any row and is reported as not found.
    pub async fn get(store: &dyn Store, resource: &ResolvedResource, id: &str) -> Result<Row, AppError> {
        let Ok(key) = id.trim().parse::<i64>() else {
            return Err(AppError::NotFound(messages::not_found(resource, id)));
        };
        match store.get(resource, key).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(AppError::NotFound(messages::not_found(resource, id))),
            Err(e) => Err(AppError::store(messages::get_failed(resource, id), e)),
        }
    }

    /// Insert one object or an array of objects in a single statement.
    /// Validation runs before anything reaches the store.
    pub async fn create(store: &dyn Store, resource: &ResolvedResource, payload: Value) -> Result<Created, AppError> {
        let batch = payload.is_array();
        RequestValidator::validate(&payload, &resource.required)?;
        let invalid_body = || AppError::Validation(messages::INVALID_BODY.into());
        let items: Vec<&Row> = match &payload {
            Value::Object(obj) => vec![obj],
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(Value::as_object)
                .collect::<Option<_>>()
                .ok_or_else(invalid_body)?,
            _ => return Err(invalid_body()),
        };

        let mut rows = Vec::with_capacity(items.len());
        for item in &items {
            let mut row = (*item).clone();
            for (column, default) in &resource.defaults {
                if !row.get(column).map(is_truthy).unwrap_or(false) {
                    row.insert(column.clone(), default.clone());
                }
            }
            password::hash_columns(resource, &mut row)
                .await
                .map_err(|e| AppError::Internal {
                    message: messages::create_failed(batch),
                    cause: e.to_string(),
                })?;
            rows.push(row);
        }

        let ids = store
            .insert(resource, &rows)
            .await
            .map_err(|e| AppError::store(messages::create_failed(batch), e))?;
        tracing::debug!(resource = %resource.path, rows = ids.len(), "created");

        let with_id = |item: &Row, id: Option<&i64>| {
            let mut out = item.clone();
            if let Some(id) = id {
                out.insert(resource.id_column.clone(), Value::from(*id));
            }
            resource.strip_sensitive(&mut out);
            Value::Object(out)
        };
        let data = if batch {
            let back_fill = resource.batch_create_ids;
            Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| with_id(*item, ids.get(i).filter(|_| back_fill)))
                    .collect(),
            )
        } else {
            with_id(items[0], ids.first())
        };
        Ok(Created { data, batch })
    }

    /// Delete every row whose delete-key column is in the body's id list. Returns the count.
    pub async fn delete(store: &dyn Store, resource: &ResolvedResource, body: &Value) -> Result<u64, AppError> {
        let field = &resource.delete_key.field;
        let bad_body = || AppError::Validation(messages::bad_delete_body(field));
        let raw = body
            .get(field)
            .and_then(Value::as_array)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(bad_body)?;
        let ids = raw.iter().map(key_of).collect::<Option<Vec<i64>>>().ok_or_else(bad_body)?;

        let affected = store
            .delete_in(resource, &resource.delete_key.column, &ids)
            .await
            .map_err(|e| AppError::store(messages::DELETE_FAILED, e))?;
        if affected == 0 {
            return Err(AppError::NotFound(messages::NOTHING_TO_DELETE.into()));
        }
        tracing::debug!(resource = %resource.path, rows = affected, "deleted");
        Ok(affected)
    }
}
