use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use chrono::Utc;

use sweetshop_auth::RESET_REQUESTED_MESSAGE;

use crate::app::dto::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse,
    ResetPasswordRequest,
};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(body) = payload?;
    let role = services
        .issuer
        .register(&body.name, &body.email, &body.password, body.role.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: format!("User registered successfully as {role}!"),
            role,
        }),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = payload?;
    let session = services
        .issuer
        .login(&body.email, &body.password, &body.role, Utc::now())
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful!",
        token: session.token,
        role: session.role,
        name: session.display_name,
    }))
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = payload?;
    services.issuer.request_password_reset(&body.email, Utc::now()).await?;
    Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = payload?;
    services
        .issuer
        .complete_password_reset(&token, &body.new_password, Utc::now())
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully!")))
}
