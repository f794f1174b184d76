//! Document intake: load bytes from a path or URL and decide how to extract them.
//!
//! Every document is size-checked here, before any extractor runs. Local
//! files are rejected from their metadata without being read; downloads are
//! rejected from `Content-Length` when the server sends one, and otherwise
//! as soon as the streamed body passes the limit.
//!
//! The media kind follows the file name: a `.pdf` suffix selects the PDF
//! text-layer extractor, anything else goes to OCR. When no name is known
//! the `%PDF` magic bytes decide.

use crate::error::DocSumError;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which extractor a document is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// PDF with (hopefully) a text layer.
    Pdf,
    /// Raster image (PNG, JPEG, TIFF, …) for OCR.
    Image,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Pdf => f.write_str("pdf"),
            MediaKind::Image => f.write_str("image"),
        }
    }
}

/// A size-checked document owned by one request.
#[derive(Clone)]
pub struct Document {
    bytes: Vec<u8>,
    kind: MediaKind,
    name: Option<String>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Document {
    /// Wrap `bytes` with an explicit kind, enforcing the intake limit.
    pub fn new(bytes: Vec<u8>, kind: MediaKind, max_bytes: u64) -> Result<Self, DocSumError> {
        check_size(bytes.len() as u64, max_bytes)?;
        Ok(Self {
            bytes,
            kind,
            name: None,
        })
    }

    /// Wrap `bytes`, inferring the kind from `name` (or the bytes themselves).
    pub fn from_bytes(
        bytes: Vec<u8>,
        name: Option<&str>,
        max_bytes: u64,
    ) -> Result<Self, DocSumError> {
        check_size(bytes.len() as u64, max_bytes)?;
        let kind = detect_kind(name, &bytes);
        Ok(Self {
            bytes,
            kind,
            name: name.map(str::to_string),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Byte length of the document.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Route a document to an extractor.
pub fn detect_kind(name: Option<&str>, bytes: &[u8]) -> MediaKind {
    match name {
        Some(n) if n.to_lowercase().ends_with(".pdf") => MediaKind::Pdf,
        Some(_) => MediaKind::Image,
        None if bytes.starts_with(b"%PDF") => MediaKind::Pdf,
        None => MediaKind::Image,
    }
}

fn check_size(size: u64, max: u64) -> Result<(), DocSumError> {
    if size > max {
        return Err(DocSumError::DocumentTooLarge { size, max });
    }
    Ok(())
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a document from a local path or an HTTP(S) URL.
pub async fn load_document(
    input: &str,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<Document, DocSumError> {
    if is_url(input) {
        download_url(input, max_bytes, timeout_secs).await
    } else {
        load_local(Path::new(input), max_bytes).await
    }
}

async fn load_local(path: &Path, max_bytes: u64) -> Result<Document, DocSumError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| io_error(path.to_path_buf(), e))?;
    if !meta.is_file() {
        return Err(DocSumError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_size(meta.len(), max_bytes)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| io_error(path.to_path_buf(), e))?;

    let name = path.file_name().map(|n| n.to_string_lossy().to_string());
    let doc = Document::from_bytes(bytes, name.as_deref(), max_bytes)?;
    debug!(
        "Loaded local {} document: {} ({} bytes)",
        doc.kind(),
        path.display(),
        doc.len()
    );
    Ok(doc)
}

fn io_error(path: PathBuf, e: std::io::Error) -> DocSumError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocSumError::PermissionDenied { path },
        _ => DocSumError::FileNotFound { path },
    }
}

async fn download_url(url: &str, max_bytes: u64, timeout_secs: u64) -> Result<Document, DocSumError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocSumError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocSumError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocSumError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocSumError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(len) = response.content_length() {
        check_size(len, max_bytes)?;
    }

    let bytes = read_capped(response.bytes_stream(), max_bytes, url).await?;

    let name = filename_from_url(url);
    let doc = Document::from_bytes(bytes, name.as_deref(), max_bytes)?;
    info!("Downloaded {} bytes ({})", doc.len(), doc.kind());
    Ok(doc)
}

/// Collect a download body, giving up as soon as it passes `max_bytes`.
async fn read_capped<S, B, E>(stream: S, max_bytes: u64, url: &str) -> Result<Vec<u8>, DocSumError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    futures::pin_mut!(stream);
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DocSumError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        body.extend_from_slice(chunk.as_ref());
        check_size(body.len() as u64, max_bytes)?;
    }
    Ok(body)
}

/// Last path segment of `url` when it looks like a file name.
fn filename_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if !last.is_empty() && last.contains('.') {
        Some(last.to_string())
    } else {
        None
    }
}
