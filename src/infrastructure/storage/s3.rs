use super::{BlobStore, StorageError};
use crate::common::upload;
use crate::config::settings::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::{Client, primitives::ByteStream};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
    public_base: Url,
    public_read: bool,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            // Custom endpoints (MinIO) need path-style addressing
            .force_path_style(config.endpoint.is_some());
        builder.set_endpoint_url(config.endpoint.clone());

        let client = Client::from_conf(builder.build());
        let public_base = public_base_url(config)?;

        info!(bucket = %config.bucket, public_base = %public_base, "S3 storage configured");

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_base,
            public_read: config.public_read,
        })
    }

    pub async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let acl = self.public_read.then_some(ObjectCannedAcl::PublicRead);
        let result = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .set_acl(acl)
            .send()
            .await
            .map_err(|e| StorageError::Initiate(DisplayErrorContext(&e).to_string()))?;

        result
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::Initiate("response carried no upload id".to_string()))
    }

    pub async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: bytes::Bytes,
    ) -> Result<CompletedPart, StorageError> {
        let result = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::UploadPart {
                part: part_number,
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let e_tag = result.e_tag().ok_or_else(|| StorageError::UploadPart {
            part: part_number,
            message: "response carried no ETag".to_string(),
        })?;

        Ok(CompletedPart::builder()
            .e_tag(e_tag)
            .part_number(part_number)
            .build())
    }

    pub async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<(), StorageError> {
        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .map_err(|e| StorageError::Complete(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    pub async fn abort_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StorageError> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| StorageError::Complete(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    pub fn public_url(&self, key: &str) -> Result<Url, StorageError> {
        public_object_url(&self.public_base, key)
    }
}

#[async_trait]
impl BlobStore for StorageService {
    async fn store(&self, local: &Path, key: &str) -> Result<Url, StorageError> {
        debug!(path = %local.display(), key, "Uploading to S3");
        upload::upload_file(self, local, key).await?;
        let url = self.public_url(key)?;
        info!(url = %url, "Video uploaded");
        Ok(url)
    }
}

fn public_base_url(config: &StorageConfig) -> Result<Url, StorageError> {
    let raw = match (&config.public_url, &config.endpoint) {
        (Some(public), _) => public.clone(),
        (None, Some(endpoint)) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
        (None, None) => format!("https://s3.amazonaws.com/{}", config.bucket),
    };
    Url::parse(&raw).map_err(|e| StorageError::PublicUrl(format!("{raw}: {e}")))
}

/// Appends `key` to `base` segment by segment so each part is percent-encoded.
pub fn public_object_url(base: &Url, key: &str) -> Result<Url, StorageError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StorageError::PublicUrl(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(key.split('/'));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_config() -> StorageConfig {
        StorageConfig {
            endpoint: None,
            region: "us-east-1".to_string(),
            bucket: "videos".to_string(),
            access_key: "access".to_string(),
            secret_key: "secret".to_string(),
            public_url: None,
            public_read: true,
        }
    }

    #[test]
    fn public_url_defaults_to_aws_path_style() {
        let base = public_base_url(&storage_config()).unwrap();
        assert_eq!(base.as_str(), "https://s3.amazonaws.com/videos");
    }

    #[test]
    fn public_url_follows_custom_endpoint() {
        let config = StorageConfig {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..storage_config()
        };
        let base = public_base_url(&config).unwrap();
        assert_eq!(base.as_str(), "http://localhost:9000/videos");
    }

    #[test]
    fn explicit_public_url_wins() {
        let config = StorageConfig {
            endpoint: Some("http://localhost:9000".to_string()),
            public_url: Some("https://cdn.example.com/".to_string()),
            ..storage_config()
        };
        let base = public_base_url(&config).unwrap();
        let url = public_object_url(&base, "abc/clip.mp4").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/abc/clip.mp4");
    }

    #[test]
    fn object_key_is_percent_encoded() {
        let base = Url::parse("https://s3.amazonaws.com/videos").unwrap();
        let url = public_object_url(&base, "job-1/Demo Video-abc123.mp4").unwrap();
        assert_eq!(
            url.as_str(),
            "https://s3.amazonaws.com/videos/job-1/Demo%20Video-abc123.mp4"
        );
    }
}
