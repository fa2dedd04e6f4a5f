//! Checker diagnostics (artifact coordinates) → document diagnostics.
//!
//! Anything on a header line is not attributable to the document and goes to
//! the side channel as a declaration-level error.
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifact::SyntheticArtifact;

/// Zero-based line / character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// One finding of the external checker, in the checked file's coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerDiagnostic {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub character: u32,
    pub length: u32,
    pub code: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDiagnostic {
    pub range: Range,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remapped {
    InDocument(DocumentDiagnostic),
    /// The error sits in the synthesized header (bad import, unknown type name).
    Declaration(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remapping {
    pub diagnostics: Vec<DocumentDiagnostic>,
    pub declaration_errors: Vec<String>,
}

/// Remap a single diagnostic. `None` when it belongs to another file.
pub fn remap(diag: &CheckerDiagnostic, artifact: &SyntheticArtifact) -> Option<Remapped> {
    let file = diag.file.as_deref()?;
    if !same_file(file, &artifact.path) {
        return None;
    }

    let header = artifact.header_line_count;
    if diag.line < header {
        return Some(Remapped::Declaration(format!(
            "Error in $type: {}\n{}",
            diag.message,
            artifact.path.display()
        )));
    }

    let line = diag.line - header;
    Some(Remapped::InDocument(DocumentDiagnostic {
        range: Range::new(
            Position::new(line, diag.character),
            Position::new(line, diag.character.saturating_add(diag.length)),
        ),
        message: diag.message.clone(),
    }))
}

pub fn remap_all<'a, I>(diags: I, artifact: &SyntheticArtifact, ignored_codes: &[u32]) -> Remapping
where
    I: IntoIterator<Item = &'a CheckerDiagnostic>,
{
    let mut out = Remapping::default();
    for diag in diags {
        if diag.code.is_some_and(|code| ignored_codes.contains(&code)) {
            continue;
        }
        match remap(diag, artifact) {
            Some(Remapped::InDocument(d)) => out.diagnostics.push(d),
            Some(Remapped::Declaration(msg)) => out.declaration_errors.push(msg),
            None => {}
        }
    }
    out
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
