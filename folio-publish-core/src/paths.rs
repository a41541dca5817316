//! Storage paths and file names derived from a submission's category, title and image index.
//!
//! Everything here is pure: the same inputs always give the same paths, which is what makes
//! re-submitting a project overwrite the previous files instead of piling up new ones.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::{NamingScheme, PublishConfig};

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn non_slug_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// Lower-cases `category` and replaces each run of whitespace with a single hyphen.
///
/// `"Web Design"` becomes `"web-design"`; already kebab-cased input is returned unchanged.
pub fn category_slug(category: &str) -> String {
    whitespace_runs()
        .replace_all(category.trim(), "-")
        .to_lowercase()
}

/// Stricter slug for free text such as titles: anything outside `[a-z0-9]` becomes a hyphen.
pub fn text_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    non_slug_runs()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

fn join(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{base}/{rest}")
    }
}

fn storage_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Directories shared by every image of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub category_slug: String,
    /// Root assets directory; must exist before anything is uploaded.
    pub assets_root: String,
    /// Category-specific directory the images are stored in.
    pub assets_directory: String,
    /// Public URL of `assets_directory`, as referenced from markdown.
    pub assets_url: String,
    pub markdown_directory: String,
}

/// Paths for the `n`-th image of a submission and its markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    /// 1-based position within the submission.
    pub number: usize,
    pub asset_path: String,
    pub asset_url: String,
    pub markdown_file_name: String,
    pub markdown_path: String,
}

/// Derives paths for one deployment layout.
#[derive(Debug, Clone)]
pub struct PathResolver {
    config: PublishConfig,
    extension: &'static str,
}

impl PathResolver {
    pub fn new(config: PublishConfig, extension: &'static str) -> Self {
        Self { config, extension }
    }

    pub fn directories(&self, category: &str) -> ResolvedPaths {
        let slug = category_slug(category);
        let assets_root = storage_path(&self.config.assets_root);
        ResolvedPaths {
            assets_directory: join(&assets_root, &slug),
            assets_url: join(&self.config.assets_url_prefix, &slug),
            markdown_directory: storage_path(&self.config.markdown_root),
            assets_root,
            category_slug: slug,
        }
    }

    /// Resolves the paths for the image at 0-based `index`.
    pub fn resolve(&self, category: &str, title: &str, index: usize) -> ResolvedItem {
        let dirs = self.directories(category);
        let number = index + 1;
        let image_name = format!("{number}.{}", self.extension);
        let markdown_file_name = self.markdown_file_name(category, &dirs.category_slug, title, number);
        ResolvedItem {
            number,
            asset_path: join(&dirs.assets_directory, &image_name),
            asset_url: join(&dirs.assets_url, &image_name),
            markdown_path: join(&dirs.markdown_directory, &markdown_file_name),
            markdown_file_name,
        }
    }

    fn markdown_file_name(&self, category: &str, slug: &str, title: &str, number: usize) -> String {
        match self.config.naming {
            NamingScheme::CategoryPrefix => {
                let prefix: String = category.trim().chars().take(2).collect::<String>().to_uppercase();
                format!("{}{prefix}{number}.md", self.config.document_prefix)
            }
            NamingScheme::Padded => format!("{slug}-{number:03}.md"),
            NamingScheme::TitleSlug => format!("{}-{number}.md", text_slug(title)),
        }
    }
}
