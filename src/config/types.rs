//! Raw resource descriptor types matching `config/resources.json`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Store type of a column. Drives the cast applied to every bound value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    Bigint,
    Numeric,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
}

impl ColumnType {
    /// PostgreSQL type name used in casts and DDL.
    pub fn pg_name(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Bigint => "bigint",
            ColumnType::Numeric => "numeric",
            ColumnType::Double => "double precision",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_: ColumnType,
}

/// How a required field counts as present. Resources disagree on this and the
/// disagreement is part of their contract with existing clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Missing, `null`, `false`, `0` and `""` all count as absent.
    Truthy,
    /// The key only has to exist; `null` and other falsy values pass.
    Present,
    /// The key must exist with a value other than `null` or `""`.
    NonNull,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequiredField {
    pub field: String,
    pub policy: Presence,
}

/// Body property carrying the id list of a bulk delete, and the column it matches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteKeyConfig {
    pub field: String,
    pub column: String,
}

impl Default for DeleteKeyConfig {
    fn default() -> Self {
        DeleteKeyConfig {
            field: "ids".into(),
            column: "id".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Payload property identifying the row(s) to update.
    #[serde(default = "default_id")]
    pub key: String,
    /// Extra fields every update item must carry (truthy check).
    #[serde(default)]
    pub required: Vec<String>,
    /// HTTP status for transactional failures that are not a missing row.
    #[serde(default = "default_failure_status")]
    pub failure_status: u16,
    /// Columns accepted by `PUT /:id`. `None` accepts every column.
    #[serde(default)]
    pub path_columns: Option<Vec<String>>,
    /// Report a missing row as the generic failure instead of 404.
    #[serde(default)]
    pub not_found_as_failure: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        UpdateConfig {
            key: default_id(),
            required: Vec::new(),
            failure_status: default_failure_status(),
            path_columns: None,
            not_found_as_failure: false,
        }
    }
}

/// Scalar value joined into read rows: `table.select` where `table.id = row.column`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupConfig {
    pub column: String,
    pub table: String,
    pub select: String,
    pub alias: String,
    /// Joined into `GET /` rows only, not into `GET /:id`.
    #[serde(default)]
    pub list_only: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub path: String,
    pub table: String,
    pub label: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub required: Vec<RequiredField>,
    #[serde(default = "default_id")]
    pub id_column: String,
    #[serde(default)]
    pub delete_key: DeleteKeyConfig,
    #[serde(default)]
    pub update: UpdateConfig,
    /// Back-fill generated ids into the response of array creates.
    #[serde(default)]
    pub batch_create_ids: bool,
    #[serde(default)]
    pub lookups: Vec<LookupConfig>,
    /// Columns that must never be exposed in API responses (e.g. password hashes).
    #[serde(default)]
    pub sensitive_columns: Vec<String>,
    #[serde(default)]
    pub hashed_columns: Vec<String>,
    /// Values substituted on create when the payload value is falsy.
    #[serde(default)]
    pub defaults: Map<String, Value>,
}

fn default_id() -> String {
    "id".into()
}

fn default_failure_status() -> u16 {
    400
}
