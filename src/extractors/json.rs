//! Lenient JSON body extractor whose rejections use the response envelope.

use crate::error::AppError;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde_json::Value;

pub const MALFORMED_BODY: &str = "Bad Request: Body bukan JSON yang valid";

/// Request body parsed as JSON. Content-Type is not enforced and an empty
/// body reads as `null`, so a bodiless DELETE gets the resource's own
/// validation message instead of a parser error.
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| AppError::Rejected {
            status: e.status(),
            message: MALFORMED_BODY.into(),
            cause: e.body_text(),
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(Value::Null));
        }
        let value = serde_json::from_slice(&bytes).map_err(|e| AppError::Rejected {
            status: axum::http::StatusCode::BAD_REQUEST,
            message: MALFORMED_BODY.into(),
            cause: e.to_string(),
        })?;
        Ok(JsonBody(value))
    }
}
