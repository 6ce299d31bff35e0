//! `POST /api/login`: check a username/password pair without opening a session.

use std::collections::BTreeMap;

use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    routing::post,
    Form, Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::auth::LoginRequest;
use crate::error::ValidationError;
use crate::ApiError;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/login", post(handler))
}

/// Credentials from a JSON body, or from a urlencoded form when the
/// content type says so.
struct LoginBody(LoginRequest);

impl<S: Send + Sync> FromRequest<S> for LoginBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        // ---
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let parsed = if is_form {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(body)| body)
                .map_err(|e| e.body_text())
        } else {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map(|Json(body)| body)
                .map_err(|e| e.body_text())
        };

        parsed.map(LoginBody).map_err(|reason| {
            ApiError::Validation(ValidationError {
                errors: BTreeMap::from([("body", reason)]),
            })
        })
    }
}

async fn handler(
    State(state): State<AppState>,
    LoginBody(request): LoginBody,
) -> Result<Json<Value>, ApiError> {
    // ---
    let caller = request.validate()?;
    let authorized = state
        .authorizer
        .authorize(&caller)
        .ok_or(ApiError::InvalidCredentials)?;

    info!("Login succeeded for '{}'", authorized.username());
    Ok(Json(json!({
        "message": "Login successful",
        "username": authorized.username(),
    })))
}
