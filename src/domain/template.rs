use std::path::{Path, PathBuf};

use super::ContentType;
use crate::utils::sanitize_filename;

const TITLE_PLACEHOLDER: &str = "%(title)s";
const EXT_PLACEHOLDER: &str = "%(ext)s";
const ID_PLACEHOLDER: &str = "%(id)s";
/// Kept under the common 255-byte file name limit.
const MAX_NAME_BYTES: usize = 240;
const MAX_ID_BYTES: usize = 64;
const MAX_EXTENSION_BYTES: usize = 16;
const FALLBACK_TITLE: &str = "media";

/// Output naming for one request: `<root>/<namespace>_<title>_<id>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    root: PathBuf,
    content_type: ContentType,
}

impl OutputTemplate {
    pub fn new(root: impl Into<PathBuf>, content_type: ContentType) -> Self {
        Self {
            root: root.into(),
            content_type,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn default_extension(&self) -> &'static str {
        self.content_type.default_extension()
    }

    /// Pattern passed to the extractor's `-o` flag. The extractor fills in
    /// the placeholders; the result is renamed through [`Self::file_name`]
    /// afterwards, so remote titles never reach the filesystem unsanitized.
    pub fn pattern(&self) -> String {
        self.root
            .join(format!(
                "{}_{TITLE_PLACEHOLDER}_{ID_PLACEHOLDER}.{EXT_PLACEHOLDER}",
                self.content_type.namespace()
            ))
            .to_string_lossy()
            .into_owned()
    }

    /// Final file name for a title reported by remote metadata. The media
    /// id, when known, keeps posts with identical titles apart. The whole
    /// name stays within [`MAX_NAME_BYTES`]; the title is shortened first.
    pub fn file_name(&self, title: &str, id: Option<&str>, extension: &str) -> String {
        let namespace = self.content_type.namespace();

        let mut extension: String = extension
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(MAX_EXTENSION_BYTES)
            .collect::<String>()
            .to_ascii_lowercase();
        if extension.is_empty() {
            extension = self.default_extension().to_string();
        }

        let suffix = id
            .map(sanitize_filename)
            .map(|id| trim_name(truncate_bytes(&id, MAX_ID_BYTES)).to_string())
            .filter(|id| !id.is_empty())
            .map(|id| format!("_{id}"))
            .unwrap_or_default();

        let budget = MAX_NAME_BYTES
            .saturating_sub(namespace.len() + 1)
            .saturating_sub(suffix.len())
            .saturating_sub(extension.len() + 1);
        let title = sanitize_filename(title);
        let title = match trim_name(truncate_bytes(&title, budget)) {
            "" => FALLBACK_TITLE,
            trimmed => trimmed,
        };

        format!("{namespace}_{title}{suffix}.{extension}")
    }

    pub fn render(&self, title: &str, id: Option<&str>, extension: &str) -> PathBuf {
        self.root.join(self.file_name(title, id, extension))
    }
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(|c| c == '.' || c == ' ')
}

/// Longest prefix of `s` no longer than `max` bytes, cut on a char boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
