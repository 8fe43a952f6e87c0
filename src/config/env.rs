use std::str::FromStr;

use super::ConfigError;

pub enum EnvKey {
    ServerPort,
    JwtSecret,
    AccountsFile,
    S3Endpoint,
    S3Region,
    S3Bucket,
    S3AccessKey,
    S3SecretKey,
    S3PublicUrl,
    S3PublicRead,
    MailgunApiBase,
    MailgunDomain,
    MailgunApiKey,
    MailgunFrom,
    MailgunWebhookKey,
    DownloaderBin,
    DownloaderArgs,
    WorkDir,
    FetchTimeoutSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::AccountsFile => "ACCOUNTS_FILE",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::S3PublicUrl => "S3_PUBLIC_URL",
            EnvKey::S3PublicRead => "S3_PUBLIC_READ",
            EnvKey::MailgunApiBase => "MAILGUN_API_BASE",
            EnvKey::MailgunDomain => "MAILGUN_DOMAIN",
            EnvKey::MailgunApiKey => "MAILGUN_API_KEY",
            EnvKey::MailgunFrom => "MAILGUN_FROM",
            EnvKey::MailgunWebhookKey => "MAILGUN_WEBHOOK_SIGNING_KEY",
            EnvKey::DownloaderBin => "DOWNLOADER_BIN",
            EnvKey::DownloaderArgs => "DOWNLOADER_ARGS",
            EnvKey::WorkDir => "WORK_DIR",
            EnvKey::FetchTimeoutSecs => "FETCH_TIMEOUT_SECS",
        }
    }
}

/// Reads [`EnvKey`] values through a lookup function, so settings can be
/// built from the process environment or from a fixed map.
pub struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Blank values count as unset.
    pub fn optional(&self, key: EnvKey) -> Option<String> {
        (self.lookup)(key.as_str()).filter(|v| !v.trim().is_empty())
    }

    pub fn get(&self, key: EnvKey) -> Result<String, ConfigError> {
        let name = key.as_str();
        self.optional(key).ok_or(ConfigError::Missing(name))
    }

    pub fn get_or(&self, key: EnvKey, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_parsed<T: FromStr>(&self, key: EnvKey, default: T) -> Result<T, ConfigError> {
        let name = key.as_str();
        match self.optional(key) {
            Some(val) => val.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
                key: name,
                value: val,
            }),
            None => Ok(default),
        }
    }
}

pub fn from_process() -> EnvReader<impl Fn(&str) -> Option<String>> {
    EnvReader::new(|key: &str| std::env::var(key).ok())
}
