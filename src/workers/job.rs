use super::error::JobError;
use crate::modules::auth::model::Account;
use std::path::PathBuf;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub name: String,
    pub username: String,
    pub email: String,
}

impl From<&Account> for Recipient {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
        }
    }
}

/// One requested download. Owned by a single pipeline run and dropped after
/// the notification is sent.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub source_url: Url,
    /// Set once the upload succeeded.
    pub destination_url: Option<Url>,
    pub title: Option<String>,
    /// Present between a successful fetch and cleanup.
    pub local_file: Option<PathBuf>,
    pub recipient: Recipient,
    pub error: Option<JobError>,
}

impl Job {
    pub fn new(source_url: Url, recipient: Recipient) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_url,
            destination_url: None,
            title: None,
            local_file: None,
            recipient,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.destination_url.is_some()
    }

    /// Resolved title, or the source URL when metadata never arrived.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.source_url.as_str())
    }
}
