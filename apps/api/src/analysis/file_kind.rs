use std::path::Path;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Resume file type, decided by extension alone (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFileKind {
    Text,
    Pdf,
    Doc,
    Docx,
    /// Any other extension, or none. Sent to the model as if it were a PDF.
    Other,
}

impl ResumeFileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("txt") => Self::Text,
            Some("pdf") => Self::Pdf,
            Some("doc") => Self::Doc,
            Some("docx") => Self::Docx,
            _ => Self::Other,
        }
    }

    /// Text resumes are decoded and inlined into the prompt; everything else
    /// is uploaded as an attachment.
    pub fn is_inline_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// MIME type declared when the file is attached. Unrecognized extensions
    /// fall back to PDF.
    // TODO: product to confirm whether unknown extensions should be rejected instead.
    pub fn attachment_mime_type(self) -> &'static str {
        match self {
            Self::Doc => MIME_DOC,
            Self::Docx => MIME_DOCX,
            Self::Pdf | Self::Other => MIME_PDF,
            Self::Text => MIME_TEXT,
        }
    }
}
