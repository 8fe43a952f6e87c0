use crate::infrastructure::storage::StorageError;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("metadata output is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("expected title and filename, got {0} line(s)")]
    MissingLines(usize),
    #[error("refusing filename outside the work directory: {0}")]
    UnsafeFilename(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to prepare work directory: {0}")]
    WorkDir(#[source] std::io::Error),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("progress stream broke: {0}")]
    Stream(#[source] std::io::Error),
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("download did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Terminal failure of a job, reported to the recipient.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("could not read the video metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("the download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("the upload failed: {0}")]
    Storage(#[from] StorageError),
}
