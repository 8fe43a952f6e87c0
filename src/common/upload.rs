use crate::infrastructure::storage::StorageError;
use crate::infrastructure::storage::s3::StorageService;
use aws_sdk_s3::types::CompletedPart;
use bytes::Bytes;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{error, warn};

// Minimum part size for S3 is 5MB. We use 6MB to be safe.
const MIN_PART_SIZE: usize = 6 * 1024 * 1024;

const READ_CHUNK: usize = 64 * 1024;

/// Number of leading bytes inspected when sniffing a content type.
pub const SNIFF_LEN: usize = 512;

pub struct MultipartUploader<'a> {
    storage: &'a StorageService,
    key: String,
    upload_id: String,
    parts: Vec<CompletedPart>,
    part_number: i32,
    buffer: Vec<u8>,
}

impl<'a> MultipartUploader<'a> {
    pub async fn new(
        storage: &'a StorageService,
        key: String,
        content_type: &str,
    ) -> Result<Self, StorageError> {
        let upload_id = storage.create_multipart_upload(&key, content_type).await?;

        Ok(Self {
            storage,
            key,
            upload_id,
            parts: Vec::new(),
            part_number: 1,
            buffer: Vec::with_capacity(MIN_PART_SIZE),
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() >= MIN_PART_SIZE {
            self.flush_part().await?;
        }

        Ok(())
    }

    async fn flush_part(&mut self) -> Result<(), StorageError> {
        let body = Bytes::from(std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(MIN_PART_SIZE),
        ));

        let part = self
            .storage
            .upload_part(&self.key, &self.upload_id, self.part_number, body)
            .await?;

        self.parts.push(part);
        self.part_number += 1;

        Ok(())
    }

    pub async fn finish(mut self) -> Result<(), StorageError> {
        // Upload remaining buffer as last part; an empty object still needs one part
        if !self.buffer.is_empty() || self.parts.is_empty() {
            self.flush_part().await?;
        }

        self.storage
            .complete_multipart_upload(&self.key, &self.upload_id, self.parts)
            .await
    }

    pub async fn abort(&self) {
        if let Err(e) = self
            .storage
            .abort_multipart_upload(&self.key, &self.upload_id)
            .await
        {
            warn!(key = %self.key, "Failed to abort upload: {}", e);
        }
    }
}

/// Streams a local file to S3 as a multipart upload. The content type is
/// sniffed from the file's leading bytes.
pub async fn upload_file(
    storage: &StorageService,
    path: &Path,
    key: &str,
) -> Result<(), StorageError> {
    let read_err = |source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;

    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(read_err)?;
    let content_type = sniff_content_type(&head);

    let mut uploader = MultipartUploader::new(storage, key.to_string(), content_type).await?;

    if let Err(e) = uploader.write_chunk(&head).await {
        error!("Upload error: {}", e);
        uploader.abort().await;
        return Err(e);
    }

    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match file.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                error!("Read error: {}", e);
                uploader.abort().await;
                return Err(read_err(e));
            }
        };

        if let Err(e) = uploader.write_chunk(&chunk[..n]).await {
            error!("Upload error: {}", e);
            uploader.abort().await;
            return Err(e);
        }
    }

    // finish consumes the uploader, so keep what abort needs
    let upload_id = uploader.upload_id.clone();
    if let Err(e) = uploader.finish().await {
        error!("Upload error: {}", e);
        if let Err(abort_err) = storage.abort_multipart_upload(key, &upload_id).await {
            warn!(key, "Failed to abort upload: {}", abort_err);
        }
        return Err(e);
    }

    Ok(())
}

/// Content type from magic bytes. Extensions are never consulted.
pub fn sniff_content_type(head: &[u8]) -> &'static str {
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return match &head[8..12] {
            b"qt  " => "video/quicktime",
            b"M4A " => "audio/mp4",
            _ => "video/mp4",
        };
    }
    if head.starts_with(b"\x1a\x45\xdf\xa3") {
        return "video/webm";
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") {
        match &head[8..12] {
            b"AVI " => return "video/avi",
            b"WAVE" => return "audio/wave",
            _ => {}
        }
    }
    if head.starts_with(b"OggS") {
        return "application/ogg";
    }
    if head.starts_with(b"FLV\x01") {
        return "video/x-flv";
    }
    if head.starts_with(b"\x00\x00\x01\xba") || head.starts_with(b"\x00\x00\x01\xb3") {
        return "video/mpeg";
    }
    if head.starts_with(b"ID3") {
        return "audio/mpeg";
    }
    if head.starts_with(b"fLaC") {
        return "audio/flac";
    }
    if !head.is_empty()
        && std::str::from_utf8(head).is_ok()
        && !head.iter().any(|b| matches!(b, 0x00..=0x08 | 0x0e..=0x1a | 0x1c..=0x1f))
    {
        return "text/plain; charset=utf-8";
    }
    "application/octet-stream"
}
