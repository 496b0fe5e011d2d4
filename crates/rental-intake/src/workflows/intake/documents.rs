use mime::Mime;
use serde::Serialize;

use super::domain::FileAttachment;

/// Raw upload for one document slot, before it reaches the attachment store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// What the upload surface tells the client after storing a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub attachment: FileAttachment,
    /// Images and PDFs are recommended; anything else is accepted with a
    /// warning.
    pub recommended_type: bool,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Declared type when it parses and is specific, otherwise a guess from
    /// the file name.
    pub fn resolved_content_type(&self) -> Mime {
        self.content_type
            .as_deref()
            .and_then(|raw| raw.parse::<Mime>().ok())
            .filter(|declared| *declared != mime::APPLICATION_OCTET_STREAM)
            .unwrap_or_else(|| mime_guess::from_path(&self.file_name).first_or_octet_stream())
    }

    pub fn into_attachment(self, storage_key: impl Into<String>) -> FileAttachment {
        let content_type = self.resolved_content_type();
        FileAttachment {
            file_name: self.file_name,
            content_type: content_type.essence_str().to_string(),
            size_bytes: self.bytes.len() as u64,
            storage_key: storage_key.into(),
        }
    }
}

/// Advisory allow-list: any image type, or PDF.
pub fn is_recommended_type(content_type: &Mime) -> bool {
    content_type.type_() == mime::IMAGE
        || content_type.essence_str() == mime::APPLICATION_PDF.essence_str()
}
