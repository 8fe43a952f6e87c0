use crate::modules::auth::dto::*;
use crate::modules::download::dto::*;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::handler::status,
        crate::modules::auth::handler::login,
        crate::modules::download::handler::download,
        crate::modules::download::handler::download_mailgun,
    ),
    components(
        schemas(
            LoginRequest, TokenResponse, StatusResponse,
            DownloadRequest, DownloadAccepted, MailgunMessage,
        )
    ),
    tags(
        (name = "Auth", description = "Token issuance and service status"),
        (name = "Download", description = "Video download requests")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
