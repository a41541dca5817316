//! Renders the per-image markdown document: a frontmatter block followed by the description.
//!
//! Values are written as-is. Quotes or `---` inside a title or alt text are not escaped and can
//! produce frontmatter the site generator rejects.

use crate::paths::ResolvedItem;
use crate::submission::ProjectSubmission;

const DELIMITER: &str = "---";

/// Builds the document for the image at 0-based `index`.
///
/// `item` supplies the public asset URL the document points at; the caller resolves it with the
/// same index so the document always references its own image.
pub fn build(submission: &ProjectSubmission, item: &ResolvedItem, index: usize) -> String {
    let alt = submission
        .image_alts
        .get(index)
        .map(String::as_str)
        .unwrap_or_default();
    let publish_date = submission
        .publish_date
        .map(|d| d.to_string())
        .unwrap_or_default();

    let mut lines = vec![
        DELIMITER.to_string(),
        format!("title: \"{}\"", submission.title),
    ];
    if let Some(subtitle) = submission.subtitle() {
        lines.push(format!("subtitle: \"{subtitle}\""));
    }
    lines.push(format!("category: {}", submission.category));
    lines.push(format!("publishDate: {publish_date}"));
    lines.push(format!("img: {}", item.asset_url));
    lines.push(format!("img_alt: \"{alt}\""));
    if submission.tags.is_empty() {
        lines.push("tags: []".to_string());
    } else {
        lines.push("tags:".to_string());
        lines.extend(submission.tags.iter().map(|tag| format!("  - {tag}")));
    }
    lines.push(DELIMITER.to_string());
    lines.push(String::new());
    lines.push(submission.description.clone());

    lines.join("\n")
}
