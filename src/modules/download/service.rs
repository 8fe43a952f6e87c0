use super::dto::MailgunMessage;
use crate::modules::auth::model::Account;
use crate::state::AppState;
use crate::workers::job::{Job, Recipient};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq)]
pub enum SourceUrlError {
    #[error("empty url")]
    Empty,
    #[error("invalid url {0:?}: {1}")]
    Parse(String, url::ParseError),
    #[error("unsupported url scheme {0:?}")]
    Scheme(String),
}

/// Why an inbound message did not become a job.
#[derive(Debug, Error, PartialEq)]
pub enum InboundRejection {
    #[error("signature mismatch")]
    BadSignature,
    #[error("unknown sender {0}")]
    UnknownSender(String),
    #[error("no url in message body")]
    EmptyBody,
    #[error(transparent)]
    BadUrl(#[from] SourceUrlError),
}

pub struct DownloadService;

impl DownloadService {
    /// Accepts absolute http(s) URLs only.
    pub fn parse_source_url(raw: &str) -> Result<Url, SourceUrlError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SourceUrlError::Empty);
        }
        let url = Url::parse(raw).map_err(|e| SourceUrlError::Parse(raw.to_string(), e))?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(url),
            scheme => Err(SourceUrlError::Scheme(scheme.to_string())),
        }
    }

    pub fn schedule(state: &AppState, account: &Account, url: Url) -> Uuid {
        let job = Job::new(url, Recipient::from(account));
        let id = job.id;
        state.scheduler.schedule(job);
        id
    }

    /// Turns an inbound message into a scheduled job, or explains why not.
    pub fn accept_inbound(state: &AppState, msg: &MailgunMessage) -> Result<Uuid, InboundRejection> {
        if let Some(key) = &state.config.mailgun.webhook_signing_key {
            if !verify_signature(key, &msg.timestamp, &msg.token, &msg.signature) {
                return Err(InboundRejection::BadSignature);
            }
        }

        let account = state
            .accounts
            .find_user_by_email(&msg.sender)
            .ok_or_else(|| InboundRejection::UnknownSender(msg.sender.clone()))?;

        let first_line = msg
            .stripped_text
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or(InboundRejection::EmptyBody)?;
        let url = Self::parse_source_url(first_line)?;

        info!(sender = %msg.sender, url = %url, "Inbound download request");
        Ok(Self::schedule(state, account, url))
    }
}

/// Mailgun signs `timestamp + token` with the webhook signing key.
pub fn verify_signature(key: &str, timestamp: &str, token: &str, signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        warn!("Unusable webhook signing key");
        return false;
    };
    mac.update(timestamp.as_bytes());
    mac.update(token.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    expected.as_bytes().ct_eq(signature.trim().to_ascii_lowercase().as_bytes()).into()
}
