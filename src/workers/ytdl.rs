//! youtube-dl (or a compatible fork such as yt-dlp) driven through its CLI.

use super::error::{FetchError, MetadataError};
use crate::config::settings::DownloaderConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use url::Url;

/// Stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    /// File name the tool will write, relative to the work directory.
    pub filename: String,
}

#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, source: &Url, work_dir: &Path) -> Result<VideoMetadata, MetadataError>;
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, source: &Url, work_dir: &Path) -> Result<(), FetchError>;
}

pub struct YoutubeDl {
    program: String,
    extra_args: Vec<String>,
    fetch_timeout: Option<Duration>,
}

impl YoutubeDl {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Location of the binary on PATH, if any.
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    fn command(&self, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn drain_and_wait(&self, child: &mut Child, source: &Url) -> Result<ExitStatus, FetchError> {
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            while next_line(&mut reader, &mut buf).await.map_err(FetchError::Stream)? {
                debug!(url = %source, "{}", String::from_utf8_lossy(&buf));
            }
        }

        child.wait().await.map_err(|source| FetchError::Wait {
            program: self.program.clone(),
            source,
        })
    }
}

#[async_trait]
impl MetadataResolver for YoutubeDl {
    async fn resolve(&self, source: &Url, work_dir: &Path) -> Result<VideoMetadata, MetadataError> {
        let output = self
            .command(work_dir)
            .args(["-e", "--get-filename", source.as_str()])
            .output()
            .await
            .map_err(|e| MetadataError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(MetadataError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let metadata = parse_metadata(output.stdout)?;
        debug!(url = %source, title = %metadata.title, filename = %metadata.filename, "Resolved metadata");
        Ok(metadata)
    }
}

#[async_trait]
impl ContentFetcher for YoutubeDl {
    async fn fetch(&self, source: &Url, work_dir: &Path) -> Result<(), FetchError> {
        let mut child = self
            .command(work_dir)
            .args(["--newline", source.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FetchError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        info!(url = %source, "Downloading...");

        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(stderr_tail(stderr)));

        let waited = match self.fetch_timeout {
            Some(limit) => {
                let bounded =
                    tokio::time::timeout(limit, self.drain_and_wait(&mut child, source)).await;
                if let Ok(result) = bounded {
                    result
                } else {
                    warn!(url = %source, "Download timed out after {:?}, killing process", limit);
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill {}: {}", self.program, e);
                    }
                    return Err(FetchError::TimedOut(limit));
                }
            }
            None => self.drain_and_wait(&mut child, source).await,
        };

        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                if let Err(kill_err) = child.kill().await {
                    warn!("Failed to kill {}: {}", self.program, kill_err);
                }
                return Err(e);
            }
        };

        if !status.success() {
            let stderr = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };
            return Err(FetchError::Exit {
                program: self.program.clone(),
                status,
                stderr,
            });
        }

        Ok(())
    }
}

/// Reads one raw line into `buf` without its terminator. Bytes need not be
/// UTF-8. Returns false at end of stream.
async fn next_line<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(true)
}

/// Logs stderr as it arrives and returns the last few lines.
async fn stderr_tail<R: AsyncRead + Unpin>(stderr: R) -> String {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut tail: Vec<String> = Vec::with_capacity(STDERR_TAIL_LINES);
    loop {
        match next_line(&mut reader, &mut buf).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Error reading stderr: {}", e);
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        debug!("stderr: {}", line);
        if tail.len() == STDERR_TAIL_LINES {
            tail.remove(0);
        }
        tail.push(line);
    }
    tail.join("\n")
}

/// Reads the title and filename lines printed by `-e --get-filename`.
pub fn parse_metadata(stdout: Vec<u8>) -> Result<VideoMetadata, MetadataError> {
    let text = String::from_utf8(stdout)?;
    let mut lines = text.lines().map(str::trim);
    let (title, filename) = match (lines.next(), lines.next()) {
        (Some(title), Some(filename)) => (title, filename),
        (Some(_), None) => return Err(MetadataError::MissingLines(1)),
        _ => return Err(MetadataError::MissingLines(0)),
    };

    let plain_name = Path::new(filename)
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(filename));
    if !plain_name {
        return Err(MetadataError::UnsafeFilename(filename.to_string()));
    }

    Ok(VideoMetadata {
        title: title.to_string(),
        filename: filename.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_filename() {
        let meta = parse_metadata(b"Demo Video\nDemo Video-abc123.mp4\n".to_vec()).unwrap();
        assert_eq!(meta.title, "Demo Video");
        assert_eq!(meta.filename, "Demo Video-abc123.mp4");
    }

    #[test]
    fn fewer_than_two_lines_is_an_error() {
        let err = parse_metadata(b"Demo Video\n".to_vec()).unwrap_err();
        assert!(matches!(err, MetadataError::MissingLines(1)));

        let err = parse_metadata(Vec::new()).unwrap_err();
        assert!(matches!(err, MetadataError::MissingLines(0)));
    }

    #[test]
    fn empty_title_keeps_filename_in_second_line() {
        let meta = parse_metadata(b"\nclip-abc.mp4\n".to_vec()).unwrap();
        assert_eq!(meta.title, "");
        assert_eq!(meta.filename, "clip-abc.mp4");
    }

    #[test]
    fn non_utf8_output_is_an_error() {
        let err = parse_metadata(vec![0xff, 0xfe, b'\n', b'a', b'\n']).unwrap_err();
        assert!(matches!(err, MetadataError::Encoding(_)));
    }

    #[test]
    fn filename_with_path_components_is_rejected() {
        let err = parse_metadata(b"Title\n../escape.mp4\n".to_vec()).unwrap_err();
        assert!(matches!(err, MetadataError::UnsafeFilename(_)));

        let err = parse_metadata(b"Title\n/etc/passwd\n".to_vec()).unwrap_err();
        assert!(matches!(err, MetadataError::UnsafeFilename(_)));
    }

    // The fake tool is a shell script run through `sh`, passed as the first
    // extra argument, so the test never execs a freshly written file.
    #[cfg(unix)]
    mod cli {
        use super::*;
        use tempfile::TempDir;

        const FAKE_TOOL: &str = r#"
if [ "$1" = "-e" ]; then
    case "$3" in
        *broken*) echo "ERROR: Unsupported URL: $3" >&2; exit 1 ;;
    esac
    printf 'Demo Video\nDemo Video-abc123.mp4\n'
    exit 0
fi
if [ "$1" = "--newline" ]; then
    case "$2" in
        *broken*) echo "[download] starting"; echo "ERROR: fragment missing" >&2; exit 2 ;;
        *slow*) sleep 5; exit 0 ;;
        *latin1*)
            printf '[download] Destination: caf\351.mp4\n'
            printf 'WARNING: caf\351\n' >&2
            printf 'video-bytes' > "Demo Video-abc123.mp4"
            printf '[download] 100.0%% of 1.00KiB\n'
            printf 'WARNING: done\n' >&2
            exit 0 ;;
    esac
    echo "[download]   0.0% of 1.00KiB"
    echo "[download] 100.0% of 1.00KiB"
    printf 'video-bytes' > "Demo Video-abc123.mp4"
    exit 0
fi
exit 64
"#;

        fn tool(timeout: Option<Duration>) -> (YoutubeDl, TempDir) {
            let dir = tempfile::tempdir().unwrap();
            let script = dir.path().join("fake-ytdl.sh");
            std::fs::write(&script, FAKE_TOOL).unwrap();
            let config = DownloaderConfig {
                program: "sh".to_string(),
                extra_args: vec![script.to_string_lossy().to_string()],
                work_dir: dir.path().to_path_buf(),
                fetch_timeout: timeout,
            };
            (YoutubeDl::new(&config), dir)
        }

        fn url(s: &str) -> Url {
            Url::parse(s).unwrap()
        }

        #[tokio::test]
        async fn resolve_reads_title_and_filename() {
            let (ytdl, _dir) = tool(None);
            let work = tempfile::tempdir().unwrap();

            let meta = ytdl
                .resolve(&url("https://video.example.com/watch?v=abc123"), work.path())
                .await
                .unwrap();
            assert_eq!(meta.title, "Demo Video");
            assert_eq!(meta.filename, "Demo Video-abc123.mp4");
            // Metadata mode writes nothing
            assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
        }

        #[tokio::test]
        async fn resolve_non_zero_exit_carries_stderr() {
            let (ytdl, _dir) = tool(None);
            let work = tempfile::tempdir().unwrap();

            let err = ytdl
                .resolve(&url("https://video.example.com/broken"), work.path())
                .await
                .unwrap_err();
            match err {
                MetadataError::Exit { stderr, status, .. } => {
                    assert!(!status.success());
                    assert!(stderr.contains("Unsupported URL"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn resolve_missing_binary_is_spawn_error() {
            let config = DownloaderConfig {
                program: "definitely-not-a-downloader-xyz".to_string(),
                extra_args: Vec::new(),
                work_dir: std::env::temp_dir(),
                fetch_timeout: None,
            };
            let ytdl = YoutubeDl::new(&config);
            assert!(ytdl.locate().is_none());

            let err = ytdl
                .resolve(&url("https://video.example.com/watch?v=abc123"), &std::env::temp_dir())
                .await
                .unwrap_err();
            assert!(matches!(err, MetadataError::Spawn { .. }));
        }

        #[tokio::test]
        async fn fetch_writes_file_into_work_dir() {
            let (ytdl, _dir) = tool(None);
            let work = tempfile::tempdir().unwrap();

            ytdl.fetch(&url("https://video.example.com/watch?v=abc123"), work.path())
                .await
                .unwrap();

            let file = work.path().join("Demo Video-abc123.mp4");
            assert_eq!(std::fs::read(file).unwrap(), b"video-bytes");
        }

        #[tokio::test]
        async fn fetch_tolerates_non_utf8_output() {
            let (ytdl, _dir) = tool(None);
            let work = tempfile::tempdir().unwrap();

            ytdl.fetch(&url("https://video.example.com/latin1"), work.path())
                .await
                .unwrap();

            assert!(work.path().join("Demo Video-abc123.mp4").exists());
        }

        #[tokio::test]
        async fn stderr_tail_keeps_non_utf8_lines() {
            let input: &[u8] = b"first\ncaf\xe9\r\nlast";
            let tail = stderr_tail(input).await;
            assert_eq!(tail, "first\ncaf\u{fffd}\nlast");
        }

        #[tokio::test]
        async fn fetch_non_zero_exit_is_fetch_error() {
            let (ytdl, _dir) = tool(None);
            let work = tempfile::tempdir().unwrap();

            let err = ytdl
                .fetch(&url("https://video.example.com/broken"), work.path())
                .await
                .unwrap_err();
            match err {
                FetchError::Exit { stderr, .. } => assert!(stderr.contains("fragment missing")),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn fetch_respects_configured_timeout() {
            let (ytdl, _dir) = tool(Some(Duration::from_millis(200)));
            let work = tempfile::tempdir().unwrap();

            let err = ytdl
                .fetch(&url("https://video.example.com/slow"), work.path())
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::TimedOut(_)));
        }
    }
}
