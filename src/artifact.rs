//! Synthetic artifact: the document's literal text behind a two-line header
//! that imports the tagged type and asserts the document against it.
use std::path::{Path, PathBuf};

use crate::tag::TypeTag;

pub const DEFAULT_FILE_NAME: &str = "temp-validation.ts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticArtifact {
    pub path: PathBuf,
    pub content: String,
    /// Lines prepended before the document text; the offset the remapper subtracts.
    pub header_line_count: u32,
}

/// The header lines, in order. Their count is the artifact's `header_line_count`.
pub fn header(tag: &TypeTag) -> [String; 2] {
    [
        format!("import {{ {} }} from \"{}\";", tag.import, tag.from),
        // the tag field is part of the literal but not of the imported type
        format!(
            "export const data: {} & {{ $type: {{ $from: string, $import: string }} }} = ",
            tag.import
        ),
    ]
}

/// Fixed per document directory, so every request for a document targets the same file.
pub fn artifact_path(document_path: &Path, file_name: &str) -> PathBuf {
    match document_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

pub fn synthesize(document_path: &Path, text: &str, tag: &TypeTag, file_name: &str) -> SyntheticArtifact {
    let header = header(tag);
    let mut content = String::with_capacity(text.len() + 128);
    for line in &header {
        content.push_str(line);
        content.push('\n');
    }
    content.push_str(text);

    SyntheticArtifact {
        path: artifact_path(document_path, file_name),
        content,
        header_line_count: header.len() as u32,
    }
}
