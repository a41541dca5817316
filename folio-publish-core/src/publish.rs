//! Commit workflow: validate → ensure directories → upload assets → write documents.
//!
//! This module turns one [`ProjectSubmission`] into a series of single-file commits against a
//! [`ContentStore`]:
//!   - Validates the submission before touching the store
//!   - Checks that the assets root exists and applies the [`DirectoryPolicy`] to the category
//!     directory
//!   - Converts each image with the [`ImageEncoder`] and writes it, reusing the existing
//!     revision token so re-submissions update in place
//!   - Writes one markdown document per image, in the same order and with the same indices
//!
//! # Error Handling
//! The first failure stops the run and is returned as a [`PublishError`] carrying the stage and
//! the 1-based image index. Files committed before the failure stay committed; there is no
//! rollback.
//!
//! # Concurrency
//! Strictly sequential: every store call is awaited before the next starts. The publisher holds
//! only immutable configuration, so one instance can serve many requests.

use tracing::{debug, error, info, warn};

use crate::config::{DirectoryPolicy, PublishConfig};
use crate::contract::{ContentStore, ImageEncoder, PutFile, RemoteEntry, RevisionToken};
use crate::error::{PublishError, PublishErrorKind, PublishStage, StoreError};
use crate::markdown;
use crate::paths::{PathResolver, ResolvedPaths};
use crate::submission::ProjectSubmission;

const PLACEHOLDER_FILE: &str = ".gitkeep";

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommitReport {
    /// Markdown file names in submission order.
    pub created_files: Vec<String>,
    /// Public path of the category's assets directory.
    pub assets_path: String,
}

pub struct Publisher<S, E> {
    store: S,
    encoder: E,
    config: PublishConfig,
    resolver: PathResolver,
}

impl<S, E> Publisher<S, E>
where
    S: ContentStore,
    E: ImageEncoder,
{
    pub fn new(store: S, encoder: E, config: PublishConfig) -> Self {
        let resolver = PathResolver::new(config.clone(), encoder.extension());
        Self {
            store,
            encoder,
            config,
            resolver,
        }
    }

    /// Runs the full workflow for one submission.
    pub async fn publish(
        &self,
        submission: &ProjectSubmission,
    ) -> Result<CommitReport, PublishError> {
        info!(
            title = %submission.title,
            category = %submission.category,
            images = submission.images.len(),
            "[PUBLISH] Starting publish"
        );

        if let Err(e) = submission.validate() {
            error!(error = %e, "[PUBLISH][ERROR] Submission rejected");
            return Err(PublishError::new(PublishStage::Validating, e));
        }

        let dirs = self.resolver.directories(&submission.category);
        debug!(?dirs, "[PUBLISH] Resolved paths");

        self.ensure_directories(&dirs).await?;
        self.upload_assets(submission, &dirs).await?;
        let created_files = self.write_documents(submission).await?;

        info!(
            files = ?created_files,
            assets_path = %dirs.assets_url,
            "[PUBLISH] Publish complete"
        );
        Ok(CommitReport {
            created_files,
            assets_path: dirs.assets_url,
        })
    }

    async fn ensure_directories(&self, dirs: &ResolvedPaths) -> Result<(), PublishError> {
        let stage = PublishStage::EnsuringDirectories;
        let missing = |path: &str| {
            PublishError::new(
                stage,
                PublishErrorKind::DirectoryMissing {
                    path: path.to_string(),
                },
            )
        };

        match self.store.exists(&dirs.assets_root).await {
            Ok(Some(entry)) if entry.is_directory() => {
                debug!(path = %dirs.assets_root, "[PUBLISH] Assets root present");
            }
            Ok(_) => {
                error!(path = %dirs.assets_root, "[PUBLISH][ERROR] Assets root missing from repository");
                return Err(missing(&dirs.assets_root));
            }
            Err(e) => {
                error!(path = %dirs.assets_root, error = %e, "[PUBLISH][ERROR] Assets root lookup failed");
                return Err(PublishError::new(stage, e));
            }
        }

        let category_dir = match self.store.exists(&dirs.assets_directory).await {
            Ok(entry) => entry,
            Err(e) => {
                error!(path = %dirs.assets_directory, error = %e, "[PUBLISH][ERROR] Category directory lookup failed");
                return Err(PublishError::new(stage, e));
            }
        };

        match (category_dir, self.config.directory_policy) {
            (Some(RemoteEntry::Directory), _) => {
                debug!(path = %dirs.assets_directory, "[PUBLISH] Category directory present");
                Ok(())
            }
            (Some(RemoteEntry::File { .. }), _) => {
                error!(path = %dirs.assets_directory, "[PUBLISH][ERROR] A file occupies the category directory path");
                Err(missing(&dirs.assets_directory))
            }
            (None, DirectoryPolicy::Implicit) => {
                info!(path = %dirs.assets_directory, "[PUBLISH] Category directory missing, the first image will create it");
                Ok(())
            }
            (None, DirectoryPolicy::Require) => {
                error!(path = %dirs.assets_directory, "[PUBLISH][ERROR] Category directory missing");
                Err(missing(&dirs.assets_directory))
            }
            (None, DirectoryPolicy::Placeholder) => {
                let path = format!("{}/{PLACEHOLDER_FILE}", dirs.assets_directory);
                let request = PutFile {
                    message: format!("Create {}", dirs.assets_directory),
                    path: path.clone(),
                    content: Vec::new(),
                    revision: None,
                };
                self.store.put_file(request).await.map_err(|e| {
                    error!(path = %path, error = %e, "[PUBLISH][ERROR] Failed to create category directory");
                    PublishError::new(stage, e)
                })?;
                info!(path = %path, "[PUBLISH] Created category directory");
                Ok(())
            }
        }
    }

    async fn upload_assets(
        &self,
        submission: &ProjectSubmission,
        dirs: &ResolvedPaths,
    ) -> Result<(), PublishError> {
        let stage = PublishStage::UploadingAssets;

        for (index, raw) in submission.images.iter().enumerate() {
            let item = self
                .resolver
                .resolve(&submission.category, &submission.title, index);
            let number = item.number;
            info!(
                index = number,
                bytes = raw.len(),
                name = submission.image_names.get(index).map(String::as_str).unwrap_or(""),
                "[PUBLISH][ASSET] Converting image"
            );

            let encoded = self.encoder.encode(raw).map_err(|e| {
                error!(index = number, error = %e, "[PUBLISH][ERROR][ASSET] Image conversion failed");
                PublishError::at_index(stage, number, e)
            })?;
            info!(
                index = number,
                width = encoded.metadata.width,
                height = encoded.metadata.height,
                format = %encoded.metadata.source_format,
                bytes = encoded.bytes.len(),
                "[PUBLISH][ASSET] Image converted"
            );

            let revision = self
                .revision_of(&item.asset_path)
                .await
                .map_err(|e| PublishError::at_index(stage, number, e))?;
            let verb = if revision.is_some() { "Update" } else { "Add" };
            let request = PutFile {
                path: item.asset_path.clone(),
                content: encoded.bytes,
                message: format!("{verb} image {number} for {}", dirs.category_slug),
                revision,
            };

            if let Err(e) = self.store.put_file(request).await {
                error!(index = number, path = %item.asset_path, error = %e, "[PUBLISH][ERROR][ASSET] Upload failed");
                return Err(PublishError::at_index(stage, number, e));
            }
            info!(index = number, path = %item.asset_path, "[PUBLISH][ASSET] Image uploaded");
        }
        Ok(())
    }

    async fn write_documents(
        &self,
        submission: &ProjectSubmission,
    ) -> Result<Vec<String>, PublishError> {
        let stage = PublishStage::WritingDocuments;
        let mut created = Vec::with_capacity(submission.images.len());

        for index in 0..submission.images.len() {
            let item = self
                .resolver
                .resolve(&submission.category, &submission.title, index);
            let number = item.number;
            let content = markdown::build(submission, &item, index);

            let revision = self
                .revision_of(&item.markdown_path)
                .await
                .map_err(|e| PublishError::at_index(stage, number, e))?;
            let verb = if revision.is_some() { "Update" } else { "Add" };
            let request = PutFile {
                path: item.markdown_path.clone(),
                content: content.into_bytes(),
                message: format!("{verb} {}", item.markdown_file_name),
                revision,
            };

            if let Err(e) = self.store.put_file(request).await {
                error!(index = number, path = %item.markdown_path, error = %e, "[PUBLISH][ERROR][DOC] Write failed");
                return Err(PublishError::at_index(stage, number, e));
            }
            info!(index = number, file = %item.markdown_file_name, "[PUBLISH][DOC] Document written");
            created.push(item.markdown_file_name);
        }
        Ok(created)
    }

    /// Revision token of the file at `path`, or `None` when it does not exist yet.
    async fn revision_of(&self, path: &str) -> Result<Option<RevisionToken>, StoreError> {
        match self.store.exists(path).await {
            Ok(Some(RemoteEntry::Directory)) => {
                warn!(path = %path, "Expected a file but found a directory");
                Ok(None)
            }
            Ok(entry) => {
                let revision = entry.and_then(RemoteEntry::into_revision);
                debug!(path = %path, existing = revision.is_some(), "Looked up revision");
                Ok(revision)
            }
            Err(e) => {
                error!(path = %path, error = %e, "Revision lookup failed");
                Err(e)
            }
        }
    }
}
