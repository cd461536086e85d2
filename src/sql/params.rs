//! Convert serde_json::Value to values that sqlx can bind.
//!
//! Every value is sent as TEXT and the statement casts the placeholder to the
//! column type (`$1::integer`), so one SQL string always has the same
//! parameter types no matter what JSON types a client sends.

use crate::config::ColumnType;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Text(String),
}

impl PgBindValue {
    /// Textual form of `v` as the target column expects it.
    pub fn for_column(v: &Value, ty: ColumnType) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::String(s) => PgBindValue::Text(s.clone()),
            Value::Bool(b) => {
                let text = match ty {
                    ColumnType::Integer | ColumnType::Bigint | ColumnType::Numeric | ColumnType::Double => {
                        if *b { "1" } else { "0" }
                    }
                    _ => {
                        if *b { "true" } else { "false" }
                    }
                };
                PgBindValue::Text(text.to_string())
            }
            Value::Number(n) => PgBindValue::Text(n.to_string()),
            Value::Array(_) | Value::Object(_) => PgBindValue::Text(v.to_string()),
        }
    }

    pub fn key(id: i64) -> Self {
        PgBindValue::Text(id.to_string())
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<&str> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf)?,
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
