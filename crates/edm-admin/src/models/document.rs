//! Read-only document view resolved from an area folder

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file inside a company/area folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub drive_id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// How the browser should preview a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Pdf,
    Image,
    Office,
    Other,
}

const OFFICE_EXTENSIONS: &[&str] = &[".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];

impl Document {
    pub fn preview_kind(&self) -> PreviewKind {
        let mime = self.mime_type.to_lowercase();
        let name = self.name.to_lowercase();

        if mime.contains("pdf") || name.ends_with(".pdf") {
            PreviewKind::Pdf
        } else if mime.starts_with("image/") {
            PreviewKind::Image
        } else if mime.contains("officedocument")
            || mime.contains("word")
            || mime.contains("excel")
            || mime.contains("presentation")
            || OFFICE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        {
            PreviewKind::Office
        } else {
            PreviewKind::Other
        }
    }

    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// Human-readable size in KB below one megabyte, MB above
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 KB".to_string();
    }
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format!("{:.1} KB", kb);
    }
    format!("{:.1} MB", kb / 1024.0)
}

/// Document plus the derived fields the listing returns
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub display_size: String,
    pub preview: PreviewKind,
}

impl From<Document> for DocumentView {
    fn from(document: Document) -> Self {
        Self {
            display_size: document.display_size(),
            preview: document.preview_kind(),
            document,
        }
    }
}
