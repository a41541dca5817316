//! # contract: seams between the commit workflow and its collaborators
//!
//! The workflow in [`crate::publish`] talks to two capabilities only:
//! - [`ContentStore`]: the remote repository (existence lookup + create-or-update of one file).
//! - [`ImageEncoder`]: turns arbitrary raster bytes into the web format that gets committed.
//!
//! Both traits are annotated for `mockall` so tests can script the remote side and count calls.
//! Mocks are exported under the default `test-export-mocks` feature for use from `tests/`.

use async_trait::async_trait;
use mockall::automock;

use crate::error::{DecodeError, StoreError};

/// Opaque version identifier of a remote file (a blob SHA on GitHub).
///
/// Required when overwriting an existing file; the store rejects the write if the file has
/// changed since the token was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionToken(String);

impl RevisionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What an existence lookup found at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    File { revision: RevisionToken },
    Directory,
}

impl RemoteEntry {
    /// Revision token for files; directories have none.
    pub fn into_revision(self) -> Option<RevisionToken> {
        match self {
            RemoteEntry::File { revision } => Some(revision),
            RemoteEntry::Directory => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, RemoteEntry::Directory)
    }
}

/// A single create-or-update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFile {
    /// Repository-relative path, without a leading slash.
    pub path: String,
    /// Raw file bytes. Transport encoding is the store's concern.
    pub content: Vec<u8>,
    /// Commit message.
    pub message: String,
    /// `None` creates the file; `Some` updates it with the token as precondition.
    pub revision: Option<RevisionToken>,
}

/// Remote repository holding the published assets and documents.
///
/// Implemented by the GitHub client in the binary crate and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up `path` on the configured branch.
    ///
    /// Returns `Ok(None)` when nothing exists there; every other failure is an error.
    async fn exists(&self, path: &str) -> Result<Option<RemoteEntry>, StoreError>;

    /// Create or update one file in a single commit.
    async fn put_file(&self, request: PutFile) -> Result<(), StoreError>;
}

/// Diagnostic information about a decoded source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Detected origin format, e.g. `png` or `jpg`.
    pub source_format: String,
}

/// Result of converting one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub metadata: ImageMetadata,
}

/// Converts raw image bytes into the single target format used for assets.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ImageEncoder: Send + Sync {
    /// File extension of the produced format, without the dot.
    fn extension(&self) -> &'static str;

    fn encode(&self, raw: &[u8]) -> Result<EncodedImage, DecodeError>;
}
