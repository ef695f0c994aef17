use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use sweetshop_auth::Identity;

pub async fn root() -> &'static str {
    "Sweet Shop Backend is Running!"
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(serde_json::json!({
        "subject_id": identity.subject_id.to_string(),
        "role": identity.role.as_str(),
    }))
}
