use super::dto::{LoginRequest, StatusResponse, TokenResponse};
use super::service::AuthService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

/// Service name and version
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Service status", body = StatusResponse)
    ),
    tag = "Auth"
)]
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        name: "tubedrop server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Login and get a bearer token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth"
)]
pub async fn login(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let payload: LoginRequest = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    };
    if let Err(e) = payload.validate() {
        return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    match AuthService::login(&state, payload) {
        Ok(response) => {
            ApiSuccess(ApiResponse::success(response, "Login successful"), StatusCode::OK)
                .into_response()
        }
        Err(e) => ApiError(e.to_string(), StatusCode::UNAUTHORIZED).into_response(),
    }
}
