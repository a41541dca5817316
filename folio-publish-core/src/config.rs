use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Repository layout and workflow policy injected into the [`crate::publish::Publisher`].
///
/// Every field has a default matching the portfolio site this tool was written for, so an
/// empty YAML section is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Directory holding every category's images. Must already exist in the repository.
    pub assets_root: String,
    /// Public URL prefix under which `assets_root` is served by the site.
    pub assets_url_prefix: String,
    /// Directory the markdown documents are written to.
    pub markdown_root: String,
    pub naming: NamingScheme,
    /// Leading letters of `category_prefix` document names.
    pub document_prefix: String,
    pub directory_policy: DirectoryPolicy,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            assets_root: "public/assets".to_string(),
            assets_url_prefix: "/assets".to_string(),
            markdown_root: "src/content/work".to_string(),
            naming: NamingScheme::default(),
            document_prefix: "PG".to_string(),
            directory_policy: DirectoryPolicy::default(),
        }
    }
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            assets_root = %self.assets_root,
            markdown_root = %self.markdown_root,
            naming = ?self.naming,
            directory_policy = ?self.directory_policy,
            "Loaded publish layout"
        );
        debug!(?self, "Publish layout loaded (full debug)");
    }
}

/// How markdown document file names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingScheme {
    /// `{document_prefix}{first two letters of category, uppercased}{n}.md`, e.g. `PGWE1.md`.
    #[default]
    CategoryPrefix,
    /// `{category-slug}-{n:03}.md`, e.g. `web-design-001.md`.
    Padded,
    /// `{title-slug}-{n}.md`, e.g. `my-project-1.md`.
    TitleSlug,
}

/// What to do when a category's asset directory is not in the repository yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryPolicy {
    /// Log it and let the first image upload create the directory.
    #[default]
    Implicit,
    /// Fail the submission.
    Require,
    /// Commit an empty `.gitkeep` into the directory before uploading images.
    Placeholder,
}
