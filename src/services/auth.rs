// src/services/auth.rs

//! Auth gate: registration, login and token verification on top of the
//! credential store and the token signer.

use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        AuthResponse, LoginRequest, NewUser, PublicUser, RegisterRequest, User, VerifiedIdentity,
        normalize_email,
    },
    store::CredentialStore,
    utils::{
        hash::{burn_verification, hash_password, verify_password},
        jwt::{sign_jwt, verify_jwt},
    },
};

fn issue(user: &User, config: &Config) -> Result<AuthResponse, AppError> {
    let token = sign_jwt(user.id, &user.email, &config.jwt_secret, config.jwt_expiration)?;
    Ok(AuthResponse {
        token,
        user: PublicUser::from(user),
    })
}

/// Creates an account and signs the caller in.
pub async fn register(
    store: &dyn CredentialStore,
    config: &Config,
    request: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let request = request.normalized();
    request.validate()?;

    let hashed_password = hash_password(&request.password)?;

    let user = store
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            password: hashed_password,
        })
        .await?;

    tracing::info!("Registered user {}", user.id);
    issue(&user, config)
}

/// Exchanges credentials for a token.
///
/// Unknown email and wrong password both fail with `InvalidCredentials`.
pub async fn login(
    store: &dyn CredentialStore,
    config: &Config,
    request: LoginRequest,
) -> Result<AuthResponse, AppError> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let user = match store.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            burn_verification(&request.password);
            tracing::debug!("Login rejected");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&request.password, &user.password)? {
        tracing::debug!("Login rejected");
        return Err(AppError::InvalidCredentials);
    }

    issue(&user, config)
}

/// Checks a token and confirms its user still exists.
pub async fn verify(
    store: &dyn CredentialStore,
    config: &Config,
    token: &str,
) -> Result<VerifiedIdentity, AppError> {
    let claims = verify_jwt(token, &config.jwt_secret)?;
    let user = store
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or(AppError::InvalidToken)?;

    Ok(VerifiedIdentity {
        user_id: user.id.to_string(),
        email: user.email,
        name: user.name,
    })
}
