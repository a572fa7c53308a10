// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RegisterRequest},
    services::auth,
    store::CredentialStore,
    utils::{json::AppJson, jwt::bearer_token},
};

/// Registers a new user.
///
/// Returns 201 Created with a token and the public user object.
pub async fn register(
    State(store): State<Arc<dyn CredentialStore>>,
    State(config): State<Config>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = auth::register(store.as_ref(), &config, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(store): State<Arc<dyn CredentialStore>>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = auth::login(store.as_ref(), &config, payload).await?;
    Ok(Json(response))
}

/// Resolves the bearer token to the identity of a still-existing user.
pub async fn verify(
    State(store): State<Arc<dyn CredentialStore>>,
    State(config): State<Config>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = bearer_token(auth_header)?;

    let identity = auth::verify(store.as_ref(), &config, token).await?;
    Ok(Json(identity))
}
