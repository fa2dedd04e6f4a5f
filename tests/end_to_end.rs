use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use json_conform::checker::CommandChecker;
use json_conform::config::Config;
use json_conform::remap::{CheckerDiagnostic, DocumentDiagnostic};
use json_conform::resolver::ModuleResolver;
use json_conform::service::{CheckReport, Document, DocumentId, Host, NoLanguageService, TokioFs, TypeChecker};
use json_conform::{Collaborators, Mode, Orchestrator, Outcome};

const TYPES: &str = r#"{
    "Settings": {
        "kind": "object",
        "properties": [
            { "name": "name", "type": { "kind": "primitive", "primitive": "string" } },
            { "name": "inner", "type": { "kind": "object", "properties": [
                { "name": "count", "type": { "kind": "primitive", "primitive": "number" } },
                { "name": "label", "type": { "kind": "primitive", "primitive": "string" }, "optional": true }
            ] } }
        ]
    }
}"#;

const BAD_DOC: &str = r#"{
  "$type": { "$from": "./types.json", "$import": "Settings" },
  "name": "demo",
  "inner": {
    "count": "three"
  }
}"#;

const GOOD_DOC: &str = r#"{
  "$type": { "$from": "./types.json", "$import": "Settings" },
  "name": "demo",
  "inner": { "count": 3 }
}"#;

#[derive(Default)]
struct Recorder {
    published: Mutex<Vec<(DocumentId, Vec<DocumentDiagnostic>)>>,
    errors: Mutex<Vec<String>>,
}

impl Host for Recorder {
    fn publish(&self, document: &DocumentId, diagnostics: Vec<DocumentDiagnostic>) {
        self.published.lock().unwrap().push((document.clone(), diagnostics));
    }
    fn notify_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Reads the artifact from disk and flags the line holding `"count"`.
struct FlagCount {
    seen: Mutex<Option<String>>,
}

#[async_trait]
impl TypeChecker for FlagCount {
    async fn check(&self, roots: &[PathBuf]) -> json_conform::Result<CheckReport> {
        let root = roots[0].clone();
        let content = tokio::fs::read_to_string(&root).await?;
        let line = content.lines().position(|l| l.contains("\"count\"")).unwrap() as u32;
        *self.seen.lock().unwrap() = Some(content);
        Ok(CheckReport {
            diagnostics: vec![CheckerDiagnostic {
                file: Some(root),
                line,
                character: 4,
                length: 7,
                code: Some(2322),
                message: "Type 'string' is not assignable to type 'number'.".into(),
            }],
        })
    }
}

fn line_of(text: &str, needle: &str) -> u32 {
    text.lines().position(|l| l.contains(needle)).unwrap() as u32
}

fn orchestrator(config: Config, checker: Arc<dyn TypeChecker>, host: Arc<Recorder>) -> Orchestrator {
    Orchestrator::new(
        config,
        Collaborators {
            checker,
            fs: Arc::new(TokioFs),
            host,
            resolver: Arc::new(ModuleResolver),
            language: Arc::new(NoLanguageService),
        },
    )
}

fn workspace(doc: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("types.json"), TYPES).unwrap();
    let doc_path = dir.path().join("settings.json");
    std::fs::write(&doc_path, doc).unwrap();
    (dir, doc_path)
}

#[tokio::test]
async fn matcher_mode_points_at_the_offending_field() {
    let (_dir, doc_path) = workspace(BAD_DOC);
    let host = Arc::new(Recorder::default());
    let config = Config { mode: Mode::Matcher, ..Config::default() };
    let orchestrator = orchestrator(config.clone(), Arc::new(CommandChecker::new(&config.checker)), host.clone());

    let outcome = orchestrator.validate(&Document::json(&doc_path, BAD_DOC)).await;
    assert_eq!(outcome, Outcome::Published { diagnostics: 1, declaration_errors: 0 });

    let published = host.published.lock().unwrap();
    let (id, diagnostics) = &published[0];
    assert_eq!(id, &doc_path);
    assert_eq!(diagnostics[0].range.start.line, line_of(BAD_DOC, "\"count\""));
    assert!(diagnostics[0].message.contains("inner.count"), "{}", diagnostics[0].message);
    assert!(host.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn matcher_mode_reports_unknown_export() {
    let doc = BAD_DOC.replace("\"Settings\"", "\"Missing\"");
    let (_dir, doc_path) = workspace(&doc);
    let host = Arc::new(Recorder::default());
    let config = Config { mode: Mode::Matcher, ..Config::default() };
    let orchestrator = orchestrator(config.clone(), Arc::new(CommandChecker::new(&config.checker)), host.clone());

    let outcome = orchestrator.validate(&Document::json(&doc_path, doc)).await;
    assert_eq!(outcome, Outcome::Failed);
    let errors = host.errors.lock().unwrap();
    assert!(errors[0].starts_with("Error in $type:"), "{}", errors[0]);
    assert!(errors[0].contains("Missing"), "{}", errors[0]);
}

#[tokio::test]
async fn checker_mode_writes_remaps_and_removes_the_artifact() {
    let (dir, doc_path) = workspace(BAD_DOC);
    let host = Arc::new(Recorder::default());
    let checker = Arc::new(FlagCount { seen: Mutex::new(None) });
    let orchestrator = orchestrator(Config::default(), checker.clone(), host.clone());

    let outcome = orchestrator.validate(&Document::json(&doc_path, BAD_DOC)).await;
    assert_eq!(outcome, Outcome::Published { diagnostics: 1, declaration_errors: 0 });

    let seen = checker.seen.lock().unwrap().clone().unwrap();
    assert!(seen.starts_with("import { Settings } from \"./types.json\";\n"));
    assert!(seen.ends_with(BAD_DOC));

    let published = host.published.lock().unwrap();
    let range = published[0].1[0].range;
    assert_eq!(range.start.line, line_of(BAD_DOC, "\"count\""));
    assert_eq!((range.start.character, range.end.character), (4, 11));

    assert!(!dir.path().join("temp-validation.ts").exists());
}

#[tokio::test]
async fn untagged_documents_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let doc_path = dir.path().join("package.json");
    let host = Arc::new(Recorder::default());
    let checker = Arc::new(FlagCount { seen: Mutex::new(None) });
    let orchestrator = orchestrator(Config::default(), checker.clone(), host.clone());

    let outcome = orchestrator.validate(&Document::json(&doc_path, r#"{ "name": "x" }"#)).await;
    assert_eq!(outcome, Outcome::Untagged);
    assert!(checker.seen.lock().unwrap().is_none());
    assert!(host.published.lock().unwrap().is_empty());
    assert!(!dir.path().join("temp-validation.ts").exists());
}

// ---- binary ---- //

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_json-conform"))
}

fn run_check(dir: &Path, doc: &Path) -> std::process::Output {
    binary()
        .current_dir(dir)
        .args(["check", "--mode", "matcher", "--input"])
        .arg(doc)
        .output()
        .unwrap()
}

#[test]
fn cli_check_exit_status_follows_diagnostics() {
    let (dir, doc_path) = workspace(GOOD_DOC);
    let output = run_check(dir.path(), &doc_path);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    std::fs::write(&doc_path, BAD_DOC).unwrap();
    let output = run_check(dir.path(), &doc_path);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected_line = line_of(BAD_DOC, "\"count\"") + 1;
    assert!(stdout.contains(&format!("settings.json:{expected_line}:")), "{stdout}");
}

#[test]
fn cli_tag_prints_the_import() {
    let (dir, doc_path) = workspace(GOOD_DOC);
    let output = binary().current_dir(dir.path()).arg("tag").arg("-i").arg(&doc_path).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Settings"), "{stdout}");
    assert!(stdout.contains("./types.json"), "{stdout}");
}
