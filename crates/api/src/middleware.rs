use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use sweetshop_auth::AccessGuard;
use sweetshop_core::DomainError;

use crate::app::errors::ApiError;

/// Access Guard at the HTTP edge: verifies the bearer token and attaches the
/// caller's `Identity` to the request. Role checks happen later, in the
/// mutation dispatcher.
pub async fn auth_middleware(
    State(guard): State<AccessGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| DomainError::unauthenticated("malformed authorization header"))?,
        ),
        None => None,
    };

    let identity = guard.authenticate(authorization, Utc::now())?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
