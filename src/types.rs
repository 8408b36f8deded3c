use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::{
    de::{DeserializeOwned, IgnoredAny},
    Deserialize, Serialize,
};
use tracing::error;

use crate::{
    entry::{self, Entry},
    services::{StoreError, Totals},
};

/// Points as submitted: a form string or a JSON number. Anything else
/// (`null`, a boolean, an object) counts as zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PointsInput {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Default for PointsInput {
    fn default() -> Self {
        PointsInput::Text(String::new())
    }
}

impl PointsInput {
    pub fn points(&self) -> u32 {
        match self {
            PointsInput::Number(n) => entry::points_from_number(*n),
            PointsInput::Text(s) => entry::parse_points(s),
            PointsInput::Other(_) => 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    pub player: String,
    #[serde(default)]
    pub points: PointsInput,
    #[serde(rename = "_csrf", default)]
    pub csrf: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    #[serde(rename = "_csrf", default)]
    pub csrf: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub success: bool,
    pub entry: Entry,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub entries: Vec<Entry>,
    pub totals: Totals,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Forbidden,
    NotFound,
    BadRequest(String),
    Store(StoreError),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Invalid CSRF token".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Entry not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(err) => {
                error!(error = %err, "ledger operation failed");
                let msg = match err {
                    StoreError::Corrupt { .. } => "Ledger file is corrupt",
                    _ => "Failed to update ledger",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string())
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Body extractor that takes JSON when the request says so and a urlencoded
/// form otherwise.
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(JsonOrForm(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(JsonOrForm(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_from_json_number_or_string() {
        let req: AddRequest = serde_json::from_str(r#"{"player":"Kaille","points":12}"#).unwrap();
        assert_eq!(req.points.points(), 12);
        let req: AddRequest = serde_json::from_str(r#"{"player":"Kaille","points":"8x"}"#).unwrap();
        assert_eq!(req.points.points(), 8);
        let req: AddRequest = serde_json::from_str(r#"{"player":"Kaille"}"#).unwrap();
        assert_eq!(req.points.points(), 0);
        assert!(req.csrf.is_none());
        let req: AddRequest = serde_json::from_str(r#"{"player":"Kaille","points":null}"#).unwrap();
        assert_eq!(req.points.points(), 0);
        let req: AddRequest = serde_json::from_str(r#"{"player":"Kaille","points":true}"#).unwrap();
        assert_eq!(req.points.points(), 0);
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorResponse::new("Entry not found")).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "error": "Entry not found"}));
    }
}
