//! bcrypt hashing for columns flagged `hashed` (user passwords).

use crate::config::ResolvedResource;
use crate::error::HashError;
use crate::service::is_truthy;
use crate::store::Row;
use serde_json::Value;

pub const BCRYPT_COST: u32 = 10;

/// Hash on the blocking pool.
pub async fn hash_password(plain: String) -> Result<String, HashError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, BCRYPT_COST)).await??;
    Ok(hashed)
}

/// Replace every hashed column in `row` by its hash. Falsy values are dropped
/// so an update never overwrites a stored hash with an empty one.
pub async fn hash_columns(resource: &ResolvedResource, row: &mut Row) -> Result<(), HashError> {
    for c in resource.columns.iter().filter(|c| c.hashed) {
        let Some(v) = row.remove(&c.name) else {
            continue;
        };
        if !is_truthy(&v) {
            continue;
        }
        let plain = match v {
            Value::String(s) => s,
            other => other.to_string(),
        };
        row.insert(c.name.clone(), Value::String(hash_password(plain).await?));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve, BUNDLED_RESOURCES};
    use serde_json::json;

    #[tokio::test]
    async fn hash_verifies_with_bcrypt() {
        let hashed = hash_password("rahasia".into()).await.unwrap();
        assert!(hashed.starts_with("$2b$10$"));
        assert!(bcrypt::verify("rahasia", &hashed).unwrap());
    }

    #[tokio::test]
    async fn hash_columns_replaces_and_drops_empty() {
        let model = resolve(&load_from_str(BUNDLED_RESOURCES).unwrap()).unwrap();
        let user = model.resource("user").unwrap();

        let mut row = json!({"username": "sari", "password": "pw"}).as_object().unwrap().clone();
        hash_columns(user, &mut row).await.unwrap();
        assert_eq!(row["username"], "sari");
        assert!(bcrypt::verify("pw", row["password"].as_str().unwrap()).unwrap());

        let mut row = json!({"username": "sari", "password": ""}).as_object().unwrap().clone();
        hash_columns(user, &mut row).await.unwrap();
        assert!(!row.contains_key("password"));
    }
}
