//! Upload policy: MIME allow-lists and size ceilings per category

use crate::error::{UploadError, UploadResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIB: u64 = 1024 * 1024;

/// Resource category chosen by the uploader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Document,
    Video,
    Image,
}

impl FileCategory {
    pub const ALL: [FileCategory; 3] = [Self::Document, Self::Video, Self::Image];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "documents" | "doc" => Some(Self::Document),
            "video" | "videos" => Some(Self::Video),
            "image" | "images" | "img" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed types and ceiling for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub allowed: Vec<String>,
    pub max_bytes: u64,
}

impl CategoryRule {
    fn new(allowed: &[&str], max_bytes: u64) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            max_bytes,
        }
    }

    pub fn allows(&self, mime: &str) -> bool {
        self.allowed.iter().any(|a| a.eq_ignore_ascii_case(mime))
    }

    pub fn default_documents() -> Self {
        Self::new(
            &[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.ms-powerpoint",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                "text/plain",
                "text/csv",
            ],
            50 * MIB,
        )
    }

    pub fn default_video() -> Self {
        Self::new(&["video/mp4", "video/webm", "video/quicktime", "video/ogg"], 200 * MIB)
    }

    pub fn default_images() -> Self {
        Self::new(
            &["image/jpeg", "image/png", "image/gif", "image/webp", "image/svg+xml"],
            10 * MIB,
        )
    }
}

/// Validation rules for every category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadPolicy {
    pub documents: CategoryRule,
    pub video: CategoryRule,
    pub images: CategoryRule,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            documents: CategoryRule::default_documents(),
            video: CategoryRule::default_video(),
            images: CategoryRule::default_images(),
        }
    }
}

impl UploadPolicy {
    /// Load from JSON; omitted categories keep their defaults
    pub fn from_json(json: &str) -> UploadResult<Self> {
        let policy: Self = serde_json::from_str(json).map_err(|e| UploadError::Policy(e.to_string()))?;
        for category in FileCategory::ALL {
            let rule = policy.rule(category);
            if rule.allowed.is_empty() || rule.max_bytes == 0 {
                return Err(UploadError::Policy(format!("{} accepts nothing", category)));
            }
        }
        Ok(policy)
    }

    pub fn rule(&self, category: FileCategory) -> &CategoryRule {
        match category {
            FileCategory::Document => &self.documents,
            FileCategory::Video => &self.video,
            FileCategory::Image => &self.images,
        }
    }

    /// First category whose allow-list contains `mime`
    pub fn category_of(&self, mime: &str) -> Option<FileCategory> {
        let mime = essence(mime);
        FileCategory::ALL
            .into_iter()
            .find(|c| self.rule(*c).allows(&mime))
    }

    /// Check type then size. Media type parameters (`;charset=...`) are ignored.
    pub fn validate(&self, category: FileCategory, mime: &str, size: u64) -> UploadResult<()> {
        let rule = self.rule(category);
        let mime = essence(mime);

        if !rule.allows(&mime) {
            return Err(UploadError::UnsupportedFileType { mime, category });
        }
        if size > rule.max_bytes {
            return Err(UploadError::FileTooLarge {
                size,
                limit: rule.max_bytes,
                category,
            });
        }
        Ok(())
    }
}

fn essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_limits() {
        let policy = UploadPolicy::default();
        assert!(policy.validate(FileCategory::Document, "application/pdf", 49 * MIB).is_ok());
        assert!(policy.validate(FileCategory::Document, "application/pdf", 50 * MIB).is_ok());
        assert_eq!(
            policy.validate(FileCategory::Document, "application/pdf", 51 * MIB),
            Err(UploadError::FileTooLarge {
                size: 51 * MIB,
                limit: 50 * MIB,
                category: FileCategory::Document,
            })
        );
    }

    #[test]
    fn test_zip_is_not_a_document() {
        let err = UploadPolicy::default()
            .validate(FileCategory::Document, "application/zip", 1024)
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFileType { .. }));
        assert_eq!(err.to_string(), "file type application/zip is not allowed for document");
    }

    #[test]
    fn test_type_checked_per_category() {
        let policy = UploadPolicy::default();
        assert!(policy.validate(FileCategory::Image, "image/png", MIB).is_ok());
        assert!(policy.validate(FileCategory::Image, "video/mp4", MIB).is_err());
        assert!(policy.validate(FileCategory::Video, "video/mp4", 150 * MIB).is_ok());
        assert!(policy.validate(FileCategory::Image, "image/jpeg", 11 * MIB).is_err());
    }

    #[test]
    fn test_mime_parameters_and_case() {
        let policy = UploadPolicy::default();
        assert!(policy.validate(FileCategory::Document, "Text/Plain; charset=utf-8", 10).is_ok());
        assert_eq!(policy.category_of("IMAGE/WEBP"), Some(FileCategory::Image));
        assert_eq!(policy.category_of("application/zip"), None);
    }

    #[test]
    fn test_policy_from_json() {
        let policy = UploadPolicy::from_json(
            r#"{"images": {"allowed": ["image/png"], "max_bytes": 1024}}"#,
        )
        .unwrap();
        assert_eq!(policy.images.max_bytes, 1024);
        assert_eq!(policy.documents, CategoryRule::default_documents());
        assert!(policy.validate(FileCategory::Image, "image/jpeg", 10).is_err());

        assert!(UploadPolicy::from_json(r#"{"video": {"allowed": [], "max_bytes": 1}}"#).is_err());
        assert!(UploadPolicy::from_json(r#"{"audio": {}}"#).is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(FileCategory::parse("Documents"), Some(FileCategory::Document));
        assert_eq!(FileCategory::parse("img"), Some(FileCategory::Image));
        assert_eq!(FileCategory::parse("audio"), None);
    }
}
