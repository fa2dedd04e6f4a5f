//! Request orchestration: tag → artifact → staleness gate → checker or
//! matcher → remap → host.
//!
//! Requests that write the artifact take a ticket keyed by its path
//! (documents in the same directory share the artifact file, so they share
//! the key). Matcher requests never touch the artifact and are keyed by the
//! document alone. Before each externally visible step the ticket is checked;
//! a superseded request stops silently, and in particular never deletes the
//! artifact, which by then belongs to the newer request.
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifact::{self, SyntheticArtifact};
use crate::config::Config;
use crate::error::Error;
use crate::gate::{StalenessGate, Superseded, Ticket};
use crate::indexing::IndexedSet;
use crate::locate::locate_path;
use crate::matcher::{Matcher, Mismatch};
use crate::remap::{self, DocumentDiagnostic, Position};
use crate::service::{
    CompletionItem, CompletionKind, CompletionLabel, Document, DocumentId, FileSystem, Host, Hover, InsertText,
    LanguageService, TypeChecker, TypeResolver,
};
use crate::tag::{self, TypeTag};

/// How tagged documents are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Write the artifact and run the external checker over it.
    #[default]
    Checker,
    /// Resolve the type and run the structural matcher in-process.
    Matcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    Opened,
    Changed,
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a JSON document.
    Skipped,
    Untagged,
    /// A newer request for the same artifact (or, in matcher mode, document) took over.
    Superseded,
    Published { diagnostics: usize, declaration_errors: usize },
    /// Reported to the user through a notification; diagnostics left as they were.
    Failed,
}

#[derive(Clone)]
pub struct Collaborators {
    pub checker: Arc<dyn TypeChecker>,
    pub fs: Arc<dyn FileSystem>,
    pub host: Arc<dyn Host>,
    pub resolver: Arc<dyn TypeResolver>,
    pub language: Arc<dyn LanguageService>,
}

pub struct Orchestrator {
    config: Config,
    matcher: Matcher,
    artifacts: StalenessGate,
    documents: StalenessGate,
    indexed: IndexedSet,
    untagged_in_flight: Mutex<HashSet<DocumentId>>,
    services: Collaborators,
}

struct Staged {
    tag: TypeTag,
    artifact: SyntheticArtifact,
    ticket: Ticket,
}

// removes the document from the in-flight set when dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<DocumentId>>,
    id: DocumentId,
}

impl<'a> InFlight<'a> {
    fn enter(set: &'a Mutex<HashSet<DocumentId>>, id: &DocumentId) -> Option<Self> {
        let mut guard = set.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(id.clone()) {
            return None;
        }
        Some(Self { set, id: id.clone() })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut guard = self.set.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(&self.id);
    }
}

impl Orchestrator {
    pub fn new(config: Config, services: Collaborators) -> Self {
        Self {
            matcher: Matcher::new(config.unsupported_types),
            config,
            artifacts: StalenessGate::new(),
            documents: StalenessGate::new(),
            indexed: IndexedSet::new(),
            untagged_in_flight: Mutex::new(HashSet::new()),
            services,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn handle(&self, event: DocumentEvent, document: &Document) -> Outcome {
        debug!(?event, document = %document.id.display(), "document event");
        self.validate(document).await
    }

    /// Validate with the configured mode.
    pub async fn validate(&self, document: &Document) -> Outcome {
        self.validate_with(document, self.config.mode).await
    }

    pub async fn validate_with(&self, document: &Document, mode: Mode) -> Outcome {
        if !document.is_json() {
            return Outcome::Skipped;
        }
        let Some(staged) = self.stage_for(document, mode) else {
            debug!(document = %document.id.display(), "untagged document");
            return Outcome::Untagged;
        };
        debug!(
            document = %document.id.display(),
            from = %staged.tag.from,
            import = %staged.tag.import,
            token = staged.ticket.token(),
            ?mode,
            "validating"
        );

        let outcome = match mode {
            Mode::Checker => self.run_checker(document, &staged).await,
            Mode::Matcher => self.run_matcher(document, &staged).await,
        };
        if outcome == Outcome::Superseded {
            debug!(document = %document.id.display(), token = staged.ticket.token(), "superseded by a newer request");
        }
        outcome
    }

    // ------------------------------ stages ------------------------------- //

    fn stage(&self, document: &Document) -> Option<Staged> {
        self.stage_for(document, Mode::Checker)
    }

    fn stage_for(&self, document: &Document, mode: Mode) -> Option<Staged> {
        let tag = tag::extract(&document.text)?;
        let artifact =
            artifact::synthesize(&document.id, &document.text, &tag, &self.config.artifact_file_name);
        let ticket = match mode {
            Mode::Checker => self.artifacts.issue(artifact.path.clone()),
            Mode::Matcher => self.documents.issue(document.id.clone()),
        };
        Some(Staged { tag, artifact, ticket })
    }

    /// `Ok(false)` when the write itself failed; that is logged, not reported.
    async fn write_artifact(&self, staged: &Staged) -> Result<bool, Superseded> {
        staged.ticket.checkpoint()?;
        match self.services.fs.write(&staged.artifact.path, &staged.artifact.content).await {
            Ok(()) => Ok(true),
            Err(error) => {
                warn!(path = %staged.artifact.path.display(), %error, "failed to write artifact");
                Ok(false)
            }
        }
    }

    async fn cleanup(&self, staged: &Staged) {
        if !staged.ticket.is_current() {
            return;
        }
        if let Err(error) = self.services.fs.remove(&staged.artifact.path).await {
            debug!(path = %staged.artifact.path.display(), %error, "artifact cleanup failed");
        }
    }

    fn notify_if_current(&self, staged: &Staged, message: &str) {
        if staged.ticket.is_current() {
            self.services.host.notify_error(message);
        }
    }

    // ---------------------------- checker mode --------------------------- //

    async fn run_checker(&self, document: &Document, staged: &Staged) -> Outcome {
        if let Err(error) = serde_json::from_str::<Value>(&document.text) {
            self.notify_if_current(staged, &Error::InvalidJson(error).to_string());
            return Outcome::Failed;
        }
        match self.write_artifact(staged).await {
            Err(Superseded) => return Outcome::Superseded,
            Ok(false) => return Outcome::Failed,
            Ok(true) => {}
        }
        let outcome = self.check_artifact(document, staged).await;
        self.cleanup(staged).await;
        outcome
    }

    async fn check_artifact(&self, document: &Document, staged: &Staged) -> Outcome {
        if staged.ticket.checkpoint().is_err() {
            return Outcome::Superseded;
        }
        let roots = std::slice::from_ref(&staged.artifact.path);
        let report = match self.services.checker.check(roots).await {
            Ok(report) => report,
            Err(error) => {
                self.notify_if_current(staged, &format!("Error: {error}"));
                return Outcome::Failed;
            }
        };
        // the call ran to completion; its result is only worth anything if still current
        if staged.ticket.checkpoint().is_err() {
            return Outcome::Superseded;
        }

        let remapped = remap::remap_all(&report.diagnostics, &staged.artifact, &self.config.ignored_codes);
        for message in &remapped.declaration_errors {
            self.services.host.notify_error(message);
        }
        let outcome = Outcome::Published {
            diagnostics: remapped.diagnostics.len(),
            declaration_errors: remapped.declaration_errors.len(),
        };
        info!(document = %document.id.display(), diagnostics = remapped.diagnostics.len(), "publishing diagnostics");
        self.services.host.publish(&document.id, remapped.diagnostics);
        outcome
    }

    // ---------------------------- matcher mode --------------------------- //

    async fn run_matcher(&self, document: &Document, staged: &Staged) -> Outcome {
        let value = match serde_json::from_str::<Value>(&document.text) {
            Ok(value) => value,
            Err(error) => {
                self.notify_if_current(staged, &Error::InvalidJson(error).to_string());
                return Outcome::Failed;
            }
        };
        if staged.ticket.checkpoint().is_err() {
            return Outcome::Superseded;
        }
        let ty = match self.services.resolver.resolve(document.base_dir(), &staged.tag).await {
            Ok(ty) => ty,
            Err(error) => {
                self.notify_if_current(staged, &format!("Error in $type: {error}"));
                return Outcome::Failed;
            }
        };
        if staged.ticket.checkpoint().is_err() {
            return Outcome::Superseded;
        }

        let mismatches = self.matcher.check(Some(&value), &ty, "");
        let diagnostics = mismatch_diagnostics(&document.text, &mismatches);
        info!(document = %document.id.display(), diagnostics = diagnostics.len(), "publishing mismatches");
        let outcome = Outcome::Published { diagnostics: diagnostics.len(), declaration_errors: 0 };
        self.services.host.publish(&document.id, diagnostics);
        outcome
    }

    // ------------------------- completion / hover ------------------------ //

    pub async fn complete(&self, document: &Document, position: Position) -> Vec<CompletionItem> {
        if !document.is_json() {
            return Vec::new();
        }
        match self.stage(document) {
            Some(staged) => {
                if !matches!(self.write_artifact(&staged).await, Ok(true)) {
                    return Vec::new();
                }
                let items = self.artifact_completions(document, position, &staged).await;
                self.cleanup(&staged).await;
                items
            }
            None => self.complete_untagged(document, position).await,
        }
    }

    async fn artifact_completions(&self, document: &Document, position: Position, staged: &Staged) -> Vec<CompletionItem> {
        if staged.ticket.checkpoint().is_err() {
            return Vec::new();
        }
        let path = &staged.artifact.path;
        let language = self.services.language.as_ref();
        self.indexed.ensure_indexed(path, language, self.config.index_wait()).await;

        let shifted = shifted(position, staged.artifact.header_line_count);
        let items = language.completions(path, shifted).await;
        shape_completions(items, &document.text, position)
    }

    // Completion on an untagged document asks the language service about the
    // document itself, which may route straight back here; the in-flight set
    // breaks that loop.
    async fn complete_untagged(&self, document: &Document, position: Position) -> Vec<CompletionItem> {
        let Some(_in_flight) = InFlight::enter(&self.untagged_in_flight, &document.id) else {
            return Vec::new();
        };
        let items = self.services.language.completions(&document.id, position).await;

        // documents without a `$schema` suggestion follow an implicit schema
        // (package.json, tsconfig.json, ...); leave those alone
        if !items.iter().any(|item| item.label.text() == "$schema") {
            return items;
        }
        vec![type_tag_snippet()]
    }

    pub async fn hover(&self, document: &Document, position: Position) -> Option<Hover> {
        if !document.is_json() {
            return None;
        }
        let staged = self.stage(document)?;
        if !matches!(self.write_artifact(&staged).await, Ok(true)) {
            return None;
        }
        let hover = if staged.ticket.is_current() {
            let shifted = shifted(position, staged.artifact.header_line_count);
            self.services.language.hovers(&staged.artifact.path, shifted).await.into_iter().next()
        } else {
            None
        };
        self.cleanup(&staged).await;
        hover
    }
}

pub fn mismatch_diagnostics(text: &str, mismatches: &[Mismatch]) -> Vec<DocumentDiagnostic> {
    mismatches
        .iter()
        .map(|m| DocumentDiagnostic { range: locate_path(text, &m.path), message: m.message() })
        .collect()
}

fn shifted(position: Position, header_line_count: u32) -> Position {
    Position::new(position.line.saturating_add(header_line_count), position.character)
}

/// Keep field/property/constant suggestions with plain labels; quote field
/// names unless the cursor already sits between two quotes.
fn shape_completions(items: Vec<CompletionItem>, text: &str, position: Position) -> Vec<CompletionItem> {
    let line = text.lines().nth(position.line as usize).unwrap_or("");
    let col = position.character as usize;
    let previous = col.checked_sub(1).and_then(|i| line.chars().nth(i));
    let next = line.chars().nth(col);
    let surrounded = previous == Some('"') && next == Some('"');

    items
        .into_iter()
        .filter(|item| {
            matches!(item.kind, CompletionKind::Field | CompletionKind::Property | CompletionKind::Constant)
                && matches!(item.label, CompletionLabel::Plain(_))
        })
        .map(|item| {
            let insert = match &item.insert_text {
                Some(text) => text.value().to_string(),
                None => item.label.text().to_string(),
            };
            let insert = if item.kind == CompletionKind::Field && !surrounded {
                format!("\"{insert}\"")
            } else {
                insert
            };
            CompletionItem {
                label: item.label,
                kind: item.kind,
                insert_text: Some(InsertText::Plain(insert)),
                sort_text: None,
                preselect: false,
            }
        })
        .collect()
}

fn type_tag_snippet() -> CompletionItem {
    CompletionItem {
        label: CompletionLabel::Plain("\"$type\"".to_string()),
        kind: CompletionKind::Snippet,
        insert_text: Some(InsertText::Snippet(
            ": {\n\t\"$$from\": \"$1\",\n\t\"$$import\": \"$2\"\n}$3".to_string(),
        )),
        sort_text: Some("0".to_string()),
        preselect: true,
    }
}
