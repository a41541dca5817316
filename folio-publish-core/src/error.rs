//! Error taxonomy shared by every stage of the publishing workflow.
//!
//! Each failure class gets its own enum so callers (the HTTP front end, the CLI) can map them to
//! status codes without string matching. [`PublishError`] wraps them together with the stage and
//! the 1-based image index at which the workflow stopped.

use std::fmt;

use thiserror::Error;

/// A submission that is missing required data. Raised before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("category is required")]
    MissingCategory,
    #[error("description is required")]
    MissingDescription,
    #[error("publish date is required")]
    MissingPublishDate,
    #[error("publish date {0:?} is not a valid date (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    InvalidPublishDate(String),
    #[error("no images provided")]
    NoImages,
    #[error("alt text is required for every image: got {alts} alt texts for {images} images")]
    AltTextCountMismatch { images: usize, alts: usize },
    #[error("alt text for image {index} is empty")]
    EmptyAltText { index: usize },
}

/// Deployment settings that are missing or unusable. Reported before any request is served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{0} environment variable not set")]
    MissingVariable(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Image bytes that could not be turned into a WebP asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("image {index} is not valid base64: {message}")]
    Base64 { index: usize, message: String },
    #[error("unrecognised image format")]
    UnknownFormat,
    #[error("failed to decode {format} image: {message}")]
    Image { format: String, message: String },
    #[error("failed to encode WebP: {0}")]
    Encode(String),
}

/// Any failure reported by the remote content store, other than an expected "not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("revision conflict while writing {path}: the file changed since it was read")]
    Conflict { path: String },
    #[error("content store returned {status} for {path}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("request for {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("unexpected response for {path}: {message}")]
    MalformedResponse { path: String, message: String },
}

/// Where in the workflow a [`PublishError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStage {
    Validating,
    EnsuringDirectories,
    UploadingAssets,
    WritingDocuments,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStage::Validating => "validating",
            PublishStage::EnsuringDirectories => "ensuring_directories",
            PublishStage::UploadingAssets => "uploading_assets",
            PublishStage::WritingDocuments => "writing_documents",
        };
        f.write_str(name)
    }
}

/// The underlying cause of a failed publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("required directory {path} does not exist in the repository")]
    DirectoryMissing { path: String },
}

/// First failure of a publish run, annotated with stage and image index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishError {
    pub stage: PublishStage,
    /// 1-based image index, when the failure belongs to a single image.
    pub index: Option<usize>,
    pub kind: PublishErrorKind,
}

impl PublishError {
    pub fn new(stage: PublishStage, kind: impl Into<PublishErrorKind>) -> Self {
        Self {
            stage,
            index: None,
            kind: kind.into(),
        }
    }

    pub fn at_index(stage: PublishStage, index: usize, kind: impl Into<PublishErrorKind>) -> Self {
        Self {
            stage,
            index: Some(index),
            kind: kind.into(),
        }
    }

    /// Short human-readable message, suitable for the `error` field of a response.
    pub fn summary(&self) -> String {
        match (&self.kind, self.stage, self.index) {
            (PublishErrorKind::Validation(e), _, _) => e.to_string(),
            (PublishErrorKind::DirectoryMissing { path }, _, _) => {
                format!("Directory {path} not found in repository")
            }
            (_, PublishStage::UploadingAssets, Some(i)) => format!("Failed to process image {i}"),
            (_, PublishStage::WritingDocuments, Some(i)) => {
                format!("Failed to create markdown file for image {i}")
            }
            (_, stage, _) => format!("Failed while {stage}"),
        }
    }

    /// Underlying cause, suitable for the `details` field of a response.
    pub fn details(&self) -> Option<String> {
        match &self.kind {
            PublishErrorKind::Validation(_) | PublishErrorKind::DirectoryMissing { .. } => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details() {
            Some(details) => write!(f, "{}: {}", self.summary(), details),
            None => f.write_str(&self.summary()),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
