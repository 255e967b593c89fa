//! Attachment validation and display helpers.

use thiserror::Error;

use crate::config::AttachmentsConfig;

/// Largest accepted attachment, inclusive (10 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions accepted by default, lowercase and without the dot.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "jpg", "jpeg", "png", "txt", "zip"];

/// Why a file was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentRejection {
    #[error("Le fichier {name} est trop volumineux (max {limit})")]
    TooLarge { name: String, limit: String },

    #[error("Le format .{extension} n'est pas autorisé")]
    ExtensionNotAllowed { extension: String },
}

/// Size and extension limits applied to each selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_ATTACHMENT_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl From<&AttachmentsConfig> for AttachmentPolicy {
    fn from(config: &AttachmentsConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

impl AttachmentPolicy {
    /// Validate one file. Returns its normalized extension when accepted.
    ///
    /// Size is checked first; exactly `max_size_bytes` is accepted.
    pub fn check(&self, name: &str, size_bytes: u64) -> Result<String, AttachmentRejection> {
        if size_bytes > self.max_size_bytes {
            return Err(AttachmentRejection::TooLarge {
                name: name.to_string(),
                limit: format_size(self.max_size_bytes),
            });
        }

        let extension = extension_of(name);
        if !self.allowed_extensions.iter().any(|e| *e == extension) {
            return Err(AttachmentRejection::ExtensionNotAllowed { extension });
        }

        Ok(extension)
    }
}

/// Lowercase text after the last dot. A name without a dot is taken whole,
/// so a file named `pdf` passes as a PDF.
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// Human readable size using French units (o, Ko, Mo).
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} o")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} Ko", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} Mo", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Broad file category, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Word,
    Excel,
    Image,
    Text,
    Archive,
    Other,
}

impl FileKind {
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Word,
            "xls" | "xlsx" => Self::Excel,
            "jpg" | "jpeg" | "png" => Self::Image,
            "txt" => Self::Text,
            "zip" => Self::Archive,
            _ => Self::Other,
        }
    }

    /// Map the server's `type_fichier` label.
    pub fn from_type_label(label: &str) -> Self {
        match label {
            "PDF" => Self::Pdf,
            "Word" => Self::Word,
            "Excel" => Self::Excel,
            "Image" => Self::Image,
            "Texte" => Self::Text,
            "Archive" => Self::Archive,
            _ => Self::Other,
        }
    }
}
