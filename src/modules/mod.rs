pub mod auth;
pub mod download;
