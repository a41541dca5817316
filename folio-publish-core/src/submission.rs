//! The project submission: its JSON wire form, its decoded domain form, and validation.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{DecodeError, PublishError, PublishStage, ValidationError};

/// Publish date of a project. The form sends midnight of the chosen day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublishDate(NaiveDateTime);

impl PublishDate {
    const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare `YYYY-MM-DD`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, Self::FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::default())))
            .map(PublishDate)
            .map_err(|_| ValidationError::InvalidPublishDate(raw.to_string()))
    }
}

impl fmt::Display for PublishDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

/// A decoded project submission, ready for the commit workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSubmission {
    pub title: String,
    pub subtitle: Option<String>,
    /// Free text, slugged for paths but written verbatim into frontmatter.
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    pub publish_date: Option<PublishDate>,
    /// Raw image bytes in any common raster format, in display order.
    pub images: Vec<Vec<u8>>,
    /// Alt text per image, aligned by index with `images`.
    pub image_alts: Vec<String>,
    /// Original upload file names. Informational only.
    pub image_names: Vec<String>,
}

impl ProjectSubmission {
    /// Checks every required field. Alt texts must match the images one-to-one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        if self.publish_date.is_none() {
            return Err(ValidationError::MissingPublishDate);
        }
        if self.images.is_empty() {
            return Err(ValidationError::NoImages);
        }
        if self.image_alts.len() != self.images.len() {
            return Err(ValidationError::AltTextCountMismatch {
                images: self.images.len(),
                alts: self.image_alts.len(),
            });
        }
        if let Some(pos) = self.image_alts.iter().position(|alt| alt.trim().is_empty()) {
            return Err(ValidationError::EmptyAltText { index: pos + 1 });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        Ok(())
    }

    /// Subtitle, treating a blank value as absent.
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// JSON body posted by the admin form.
///
/// Missing fields deserialize as empty so that they surface as validation errors rather than
/// as opaque parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionPayload {
    pub title: String,
    pub subtitle: Option<String>,
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    pub image_names: Vec<String>,
    pub img_alts: Vec<String>,
    pub publish_date: String,
    /// Base64 images, optionally prefixed with a `data:image/...;base64,` URI header.
    pub images: Vec<String>,
}

impl SubmissionPayload {
    /// Decodes the base64 images and the publish date.
    ///
    /// An empty `publishDate` is kept as `None` so that the workflow's validation reports it.
    pub fn into_submission(self) -> Result<ProjectSubmission, PublishError> {
        let publish_date = match self.publish_date.trim() {
            "" => None,
            raw => Some(
                PublishDate::parse(raw)
                    .map_err(|e| PublishError::new(PublishStage::Validating, e))?,
            ),
        };

        let images = self
            .images
            .iter()
            .enumerate()
            .map(|(i, encoded)| decode_image(i + 1, encoded))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(images = images.len(), "Decoded submission payload");

        Ok(ProjectSubmission {
            title: self.title,
            subtitle: self.subtitle,
            category: self.category,
            description: self.description,
            tags: self
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            publish_date,
            images,
            image_alts: self.img_alts,
            image_names: self.image_names,
        })
    }
}

/// Removes a `data:<mime>;base64,` prefix if present.
pub fn strip_data_uri(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        if let Some(pos) = trimmed.find(";base64,") {
            return &trimmed[pos + ";base64,".len()..];
        }
    }
    trimmed
}

fn decode_image(index: usize, encoded: &str) -> Result<Vec<u8>, PublishError> {
    STANDARD.decode(strip_data_uri(encoded)).map_err(|e| {
        error!(index, error = %e, "Image payload is not valid base64");
        PublishError::at_index(
            PublishStage::Validating,
            index,
            DecodeError::Base64 {
                index,
                message: e.to_string(),
            },
        )
    })
}
