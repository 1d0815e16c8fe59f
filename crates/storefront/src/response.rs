//! JSON response envelope and request body extractor.
//!
//! Every JSON response has the shape `{"success": bool, "msg"?: string, ...payload}`.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::Serialize;

use crate::error::AppError;

/// Response envelope with an optional message and a flattened payload.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

/// Payload for responses that carry only a message.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoPayload {}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response without a message.
    pub const fn ok(payload: T) -> Self {
        Self {
            success: true,
            msg: None,
            payload,
        }
    }

    /// A successful response with a message.
    pub fn ok_with(msg: impl Into<String>, payload: T) -> Self {
        Self {
            success: true,
            msg: Some(msg.into()),
            payload,
        }
    }
}

impl ApiResponse<NoPayload> {
    /// A successful response with only a message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::ok_with(msg, NoPayload {})
    }

    /// A failed response.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: Some(msg.into()),
            payload: NoPayload {},
        }
    }
}

/// `Json` extractor whose rejection uses the response envelope.
///
/// Malformed JSON, a missing content type or a body that does not match `T`
/// all become a 400 `{"success": false, "msg": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(AppError::Validation("Invalid request body".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        cart: Vec<u32>,
    }

    #[test]
    fn test_envelope_flattens_payload() {
        let value = serde_json::to_value(ApiResponse::ok(Payload { cart: vec![1] })).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "cart": [1] }));
    }

    #[test]
    fn test_failure_shape() {
        let value = serde_json::to_value(ApiResponse::failure("Cart not found")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": false, "msg": "Cart not found" })
        );
    }
}
