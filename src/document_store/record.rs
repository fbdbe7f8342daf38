//! # Document Records
//!
//! Persistent metadata kept for every stored document, and the filename
//! splitting used to derive it from an upload.

use std::io::Read;

use serde::{Deserialize, Serialize};

use super::errors::{DocumentError, DocumentResult};

/// Metadata for a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub display_name: String,
    pub size_bytes: u64,
    /// Lowercase, no leading dot, may be empty
    pub extension: String,
}

impl DocumentRecord {
    /// Create a record for a freshly generated id from an upload filename.
    ///
    /// The size starts at zero and is filled in once the content is written.
    pub fn from_upload(id: String, original_filename: &str) -> DocumentResult<Self> {
        let (display_name, extension) = split_filename(original_filename)?;
        Ok(Self {
            id,
            display_name,
            size_bytes: 0,
            extension,
        })
    }

    /// Replace name and extension from a new upload filename.
    pub fn rename_from_upload(&mut self, original_filename: &str) -> DocumentResult<()> {
        let (display_name, extension) = split_filename(original_filename)?;
        self.display_name = display_name;
        self.extension = extension;
        Ok(())
    }

    /// Byte sink path of the content: `id.extension`
    pub fn stored_file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }

    /// Name presented to downloaders: `display_name.extension`
    pub fn original_file_name(&self) -> String {
        format!("{}.{}", self.display_name, self.extension)
    }
}

/// A loaded document: its record plus a readable content handle.
pub struct Document {
    pub record: DocumentRecord,
    pub content: Box<dyn Read + Send>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Last path component of `name`, with both `/` and `\` treated as separators.
pub(crate) fn final_component(name: &str) -> &str {
    match name.rfind(|c: char| c == '/' || c == '\\') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Split an upload filename into display name and lower-cased extension.
///
/// `"reports/Q3.Summary.PDF"` becomes `("Q3.Summary", "pdf")`; a name with no
/// dot has an empty extension.
pub fn split_filename(original_filename: &str) -> DocumentResult<(String, String)> {
    if original_filename.contains('\0') {
        return Err(DocumentError::InvalidFileName(
            original_filename.replace('\0', "\\0"),
        ));
    }

    let file_name = final_component(original_filename);
    let (base, extension) = match file_name.rfind('.') {
        Some(pos) => (&file_name[..pos], &file_name[pos + 1..]),
        None => (file_name, ""),
    };

    Ok((base.to_string(), extension.to_lowercase()))
}
