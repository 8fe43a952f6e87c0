use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;
use crate::config::env::{self, EnvKey, EnvReader};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub jwt_secret: String,
    pub accounts_file: PathBuf,
    pub storage: StorageConfig,
    pub mailgun: MailgunConfig,
    pub downloader: DownloaderConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible services (MinIO and friends).
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_url: Option<String>,
    pub public_read: bool,
}

#[derive(Clone, Debug)]
pub struct MailgunConfig {
    pub api_base: String,
    pub domain: String,
    pub api_key: String,
    pub from: String,
    pub webhook_signing_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DownloaderConfig {
    pub program: String,
    pub extra_args: Vec<String>,
    pub work_dir: PathBuf,
    /// `None` keeps fetches unbounded.
    pub fetch_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_reader(&env::from_process())
    }

    pub fn from_reader<F>(env: &EnvReader<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch_timeout = match env.get_parsed::<u64>(EnvKey::FetchTimeoutSecs, 0)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            server_port: env.get_parsed(EnvKey::ServerPort, 8080)?,
            jwt_secret: env.get(EnvKey::JwtSecret)?,
            accounts_file: PathBuf::from(env.get_or(EnvKey::AccountsFile, "accounts.json")),
            storage: StorageConfig {
                endpoint: env.optional(EnvKey::S3Endpoint),
                region: env.get_or(EnvKey::S3Region, "us-east-1"),
                bucket: env.get(EnvKey::S3Bucket)?,
                access_key: env.get(EnvKey::S3AccessKey)?,
                secret_key: env.get(EnvKey::S3SecretKey)?,
                public_url: env.optional(EnvKey::S3PublicUrl),
                public_read: env.get_parsed(EnvKey::S3PublicRead, true)?,
            },
            mailgun: MailgunConfig {
                api_base: env.get_or(EnvKey::MailgunApiBase, "https://api.mailgun.net"),
                domain: env.get(EnvKey::MailgunDomain)?,
                api_key: env.get(EnvKey::MailgunApiKey)?,
                from: env.get(EnvKey::MailgunFrom)?,
                webhook_signing_key: env.optional(EnvKey::MailgunWebhookKey),
            },
            downloader: DownloaderConfig {
                program: env.get_or(EnvKey::DownloaderBin, "youtube-dl"),
                extra_args: env
                    .optional(EnvKey::DownloaderArgs)
                    .map(|args| args.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                work_dir: env
                    .optional(EnvKey::WorkDir)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| std::env::temp_dir().join("tubedrop")),
                fetch_timeout,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reader(vars: &[(&str, &str)]) -> EnvReader<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvReader::new(move |key: &str| vars.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("JWT_SECRET", "secret"),
        ("S3_BUCKET", "videos"),
        ("AWS_ACCESS_KEY_ID", "access"),
        ("AWS_SECRET_ACCESS_KEY", "secret-key"),
        ("MAILGUN_DOMAIN", "mg.example.com"),
        ("MAILGUN_API_KEY", "key-123"),
        ("MAILGUN_FROM", "Downloads <noreply@example.com>"),
    ];

    #[test]
    fn defaults_apply_when_optional_keys_are_unset() {
        let config = AppConfig::from_reader(&reader(REQUIRED)).unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.storage.region, "us-east-1");
        assert!(config.storage.public_read);
        assert!(config.storage.endpoint.is_none());
        assert_eq!(config.mailgun.api_base, "https://api.mailgun.net");
        assert_eq!(config.downloader.program, "youtube-dl");
        assert!(config.downloader.extra_args.is_empty());
        assert!(config.downloader.fetch_timeout.is_none());
    }

    #[test]
    fn missing_required_key_is_reported_by_name() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "S3_BUCKET")
            .collect();

        let err = AppConfig::from_reader(&reader(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("S3_BUCKET")));
    }

    #[test]
    fn downloader_overrides_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DOWNLOADER_BIN", "yt-dlp"));
        vars.push(("DOWNLOADER_ARGS", "-f  best --no-playlist"));
        vars.push(("FETCH_TIMEOUT_SECS", "600"));
        vars.push(("APP_PORT", "9000"));

        let config = AppConfig::from_reader(&reader(&vars)).unwrap();
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.downloader.program, "yt-dlp");
        assert_eq!(config.downloader.extra_args, vec!["-f", "best", "--no-playlist"]);
        assert_eq!(config.downloader.fetch_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn unparsable_number_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("APP_PORT", "eighty"));

        let err = AppConfig::from_reader(&reader(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "APP_PORT", .. }));
    }
}
