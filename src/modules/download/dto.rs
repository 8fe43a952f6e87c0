use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadAccepted {
    pub job_id: Uuid,
    pub url: String,
}

/// Fields Mailgun posts when it forwards an inbound message.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MailgunMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default, rename = "stripped-text")]
    pub stripped_text: String,
}
