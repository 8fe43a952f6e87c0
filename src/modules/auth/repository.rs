use crate::modules::auth::model::{Account, AccountsFile};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Read-only account directory loaded once at startup.
#[derive(Debug, Default)]
pub struct AccountRepository {
    accounts: HashMap<String, Account>,
}

impl AccountRepository {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading accounts file {}", path.display()))?;
        let repo = Self::from_json(&raw)
            .with_context(|| format!("parsing accounts file {}", path.display()))?;
        info!(count = repo.accounts.len(), "Loaded account directory");
        Ok(repo)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: AccountsFile = serde_json::from_str(raw)?;
        let accounts = file
            .accounts
            .into_iter()
            .map(|(username, entry)| Account {
                username,
                name: entry.name,
                email: entry.email,
                password_hash: entry.password_hash,
            });
        Ok(Self::from_accounts(accounts))
    }

    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.username.clone(), account))
                .collect(),
        }
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    /// Matches a bare address or a `Name <address>` mailbox, ignoring case.
    pub fn find_user_by_email(&self, sender: &str) -> Option<&Account> {
        let address = mailbox_address(sender);
        if address.is_empty() {
            return None;
        }
        self.accounts
            .values()
            .find(|account| account.email.trim().eq_ignore_ascii_case(address))
    }
}

fn mailbox_address(sender: &str) -> &str {
    let sender = sender.trim();
    match (sender.rfind('<'), sender.rfind('>')) {
        (Some(start), Some(end)) if start < end => sender[start + 1..end].trim(),
        _ => sender,
    }
}
