//! Receipt value objects.

use serde::{Deserialize, Serialize};

/// What kind of document was uploaded, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptFormat {
    Pdf,
    Image,
    Email,
    Other,
}

impl ReceiptFormat {
    /// Infers the format from a file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => ReceiptFormat::Pdf,
            "jpg" | "jpeg" | "png" | "gif" | "heic" | "webp" | "tif" | "tiff" => {
                ReceiptFormat::Image
            }
            "eml" | "msg" => ReceiptFormat::Email,
            _ => ReceiptFormat::Other,
        }
    }
}

impl std::fmt::Display for ReceiptFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReceiptFormat::Pdf => "pdf",
            ReceiptFormat::Image => "image",
            ReceiptFormat::Email => "email",
            ReceiptFormat::Other => "other",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a stored receipt.
///
/// ```text
/// Active ──► Archived
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    #[default]
    Active,
    Archived,
}

impl ReceiptStatus {
    /// Returns true if the receipt can still be verified or archived.
    pub fn is_active(&self) -> bool {
        matches!(self, ReceiptStatus::Active)
    }
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptStatus::Active => f.write_str("active"),
            ReceiptStatus::Archived => f.write_str("archived"),
        }
    }
}
