use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub username: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Entry of the accounts file, keyed by username.
#[derive(Debug, Deserialize)]
pub struct AccountEntry {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountsFile {
    pub accounts: HashMap<String, AccountEntry>,
}
