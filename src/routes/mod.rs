//! Routes gateway: merges every endpoint sub-router and owns the shared
//! application state and the authorization extractor.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header, http::request::Parts, Router};
use tower_http::normalize_path::NormalizePath;

use crate::auth::{Authorized, Authorizer, CallerIdentity};
use crate::store::BatchStore;
use crate::{ApiError, Config};

mod batches;
mod export;
mod health;
mod login;
mod upload;


// ---

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub store: Arc<dyn BatchStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub config: Config,
}

/// The served application: `/api/upload/` and `/api/upload` reach the same
/// handler.
pub type App = NormalizePath<Router>;

pub fn app(state: AppState) -> App {
    // ---
    NormalizePath::trim_trailing_slash(router(state))
}

fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(upload::router(state.config.max_upload_bytes))
        .merge(batches::router())
        .merge(export::router())
        .merge(login::router())
        .merge(health::router())
        .with_state(state)
}

/// Handlers that take `Authorized` only run for callers the authorizer accepts.
impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        // ---
        let caller = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(CallerIdentity::from_basic_header)
            .ok_or(ApiError::Unauthorized)?;

        state.authorizer.authorize(&caller).ok_or_else(|| {
            tracing::warn!("Rejected credentials for '{}'", caller.username);
            ApiError::Unauthorized
        })
    }
}
