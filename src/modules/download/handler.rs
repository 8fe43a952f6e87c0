use super::dto::{DownloadAccepted, DownloadRequest, MailgunMessage};
use super::service::DownloadService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use axum::{
    Form,
    body::Bytes,
    extract::{Extension, State, rejection::FormRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error};

/// Schedule a video download
///
/// Answers as soon as the job is scheduled. The outcome reaches the user by email.
#[utoipa::path(
    post,
    path = "/download",
    request_body = DownloadRequest,
    responses(
        (status = 201, description = "Download scheduled", body = ApiResponse<DownloadAccepted>),
        (status = 400, description = "Invalid body or url"),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "Download",
    security(("bearer_auth" = []))
)]
pub async fn download(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    body: Bytes,
) -> impl IntoResponse {
    let payload: DownloadRequest = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(_) => {
            return ApiError("invalid json message.".to_string(), StatusCode::BAD_REQUEST)
                .into_response();
        }
    };

    debug!("parsing {}", payload.url);
    let url = match DownloadService::parse_source_url(&payload.url) {
        Ok(url) => url,
        Err(e) => return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    };

    let Some(account) = state.accounts.find_user_by_username(&claims.sub) else {
        return ApiError(
            "Unauthorized: unknown account".to_string(),
            StatusCode::UNAUTHORIZED,
        )
        .into_response();
    };

    let job_id = DownloadService::schedule(&state, account, url.clone());

    ApiSuccess(
        ApiResponse::success(
            DownloadAccepted {
                job_id,
                url: url.to_string(),
            },
            "Download scheduled",
        ),
        StatusCode::CREATED,
    )
    .into_response()
}

/// Mailgun inbound route webhook
///
/// Always answers 200: the sender has no synchronous channel to read errors from.
#[utoipa::path(
    post,
    path = "/download/mailgun",
    request_body(content = MailgunMessage, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Message acknowledged")
    ),
    tag = "Download"
)]
pub async fn download_mailgun(
    State(state): State<AppState>,
    form: Result<Form<MailgunMessage>, FormRejection>,
) -> StatusCode {
    let Form(msg) = match form {
        Ok(form) => form,
        Err(e) => {
            error!("Error decoding parameters from Mailgun: {}", e);
            return StatusCode::OK;
        }
    };
    debug!(sender = %msg.sender, "Download from Mailgun");

    if let Err(rejection) = DownloadService::accept_inbound(&state, &msg) {
        error!(sender = %msg.sender, "Ignoring Mailgun message: {}", rejection);
    }

    StatusCode::OK
}
