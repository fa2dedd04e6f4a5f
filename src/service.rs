//! Collaborator seams: the external checker, the filesystem, the host editor,
//! type resolution, and the language service behind completion/hover.
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::ir::Ty;
use crate::remap::{CheckerDiagnostic, DocumentDiagnostic, Position};
use crate::tag::TypeTag;

pub type DocumentId = PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub language_id: String,
    pub text: String,
}

impl Document {
    pub fn json(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), language_id: "json".to_string(), text: text.into() }
    }

    pub fn is_json(&self) -> bool {
        self.language_id == "json"
    }

    /// Directory `$from` is resolved against.
    pub fn base_dir(&self) -> &Path {
        self.id.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// What the external checker returns for a set of root files.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub diagnostics: Vec<CheckerDiagnostic>,
}

#[async_trait]
pub trait TypeChecker: Send + Sync {
    async fn check(&self, roots: &[PathBuf]) -> Result<CheckReport>;
}

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn write(&self, path: &Path, content: &str) -> std::io::Result<()>;
    async fn remove(&self, path: &Path) -> std::io::Result<()>;
}

/// The editor side: diagnostics collection and user notifications.
pub trait Host: Send + Sync {
    /// Replace every diagnostic previously set for `document`.
    fn publish(&self, document: &DocumentId, diagnostics: Vec<DocumentDiagnostic>);
    fn notify_error(&self, message: &str);
}

#[async_trait]
pub trait TypeResolver: Send + Sync {
    /// Resolve `tag` relative to the tagged document's directory.
    async fn resolve(&self, base_dir: &Path, tag: &TypeTag) -> Result<Ty>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Field,
    Property,
    Constant,
    Snippet,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionLabel {
    Plain(String),
    Detailed { label: String, description: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertText {
    Plain(String),
    Snippet(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: CompletionLabel,
    pub kind: CompletionKind,
    pub insert_text: Option<InsertText>,
    pub sort_text: Option<String>,
    pub preselect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub contents: Vec<String>,
}

impl CompletionLabel {
    pub fn text(&self) -> &str {
        match self {
            CompletionLabel::Plain(s) => s,
            CompletionLabel::Detailed { label, .. } => label,
        }
    }
}

impl InsertText {
    pub fn value(&self) -> &str {
        match self {
            InsertText::Plain(s) | InsertText::Snippet(s) => s,
        }
    }
}

/// Completion, hover and view management of the host's language tooling.
#[async_trait]
pub trait LanguageService: Send + Sync {
    async fn completions(&self, path: &Path, position: Position) -> Vec<CompletionItem>;
    async fn hovers(&self, path: &Path, position: Position) -> Vec<Hover>;
    /// Whether `path` is already open in some view.
    fn is_open(&self, path: &Path) -> bool;
    async fn open_beside(&self, path: &Path) -> Result<()>;
    async fn close(&self, path: &Path);
    /// Whether the service has produced diagnostics for `path`, i.e. finished indexing it.
    fn has_diagnostics(&self, path: &Path) -> bool;
}

/// Real filesystem; deletes are best-effort at the call site.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait]
impl FileSystem for TokioFs {
    async fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
        tokio::fs::write(path, content).await
    }
    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

/// For headless use: no completions, no hovers, nothing to index.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLanguageService;

#[async_trait]
impl LanguageService for NoLanguageService {
    async fn completions(&self, _path: &Path, _position: Position) -> Vec<CompletionItem> {
        Vec::new()
    }
    async fn hovers(&self, _path: &Path, _position: Position) -> Vec<Hover> {
        Vec::new()
    }
    fn is_open(&self, _path: &Path) -> bool {
        false
    }
    async fn open_beside(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
    async fn close(&self, _path: &Path) {}
    fn has_diagnostics(&self, _path: &Path) -> bool {
        true
    }
}
