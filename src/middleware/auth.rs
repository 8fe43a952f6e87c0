use crate::common::response::ApiError;
use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract token from header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned());

    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => {
            return Err(ApiError(
                "Unauthorized: Missing or invalid token".to_string(),
                StatusCode::UNAUTHORIZED,
            ));
        }
    };

    // 2. Verify JWT
    let claims = AuthService::verify_token(&token, &state.config.jwt_secret).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError(
            format!("Unauthorized: Invalid token: {}", e),
            StatusCode::UNAUTHORIZED,
        )
    })?;

    // 3. Inject claims into request extensions
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
