//! Minimal CLI: tag | artifact | check
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use tracing_subscriber::EnvFilter;

use crate::artifact;
use crate::checker::CommandChecker;
use crate::config::Config;
use crate::matcher::UnsupportedTypes;
use crate::orchestrator::{Collaborators, Mode, Orchestrator, Outcome};
use crate::remap::DocumentDiagnostic;
use crate::resolver::ModuleResolver;
use crate::service::{Document, DocumentId, Host, NoLanguageService, TokioFs};
use crate::tag;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check JSON documents against the structural type named by their `$type` tag
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// debug-level logging (overrides RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the `$type` tag of each input
    Tag(TagOut),
    /// print the synthesized artifact for each input
    Artifact(ArtifactOut),
    /// validate each input and print its diagnostics
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON configuration file; omitted fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct TagOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct ArtifactOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// validation backend
    #[arg(long, value_enum, default_value_t = ModeArg::Matcher)]
    mode: ModeArg,

    /// report array/tuple/function types instead of accepting them
    #[arg(long, default_value_t = false)]
    report_unsupported: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    /// run the external checker over the synthesized artifact
    Checker,
    /// resolve JSON type modules and match in-process
    Matcher,
}

/// Collects published diagnostics; notifications go straight to stderr.
#[derive(Default)]
struct CliHost {
    collections: Mutex<IndexMap<DocumentId, Vec<DocumentDiagnostic>>>,
    notified: Mutex<usize>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Checker => Mode::Checker,
            ModeArg::Matcher => Mode::Matcher,
        }
    }
}

impl Host for CliHost {
    fn publish(&self, document: &DocumentId, diagnostics: Vec<DocumentDiagnostic>) {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.insert(document.clone(), diagnostics);
    }
    fn notify_error(&self, message: &str) {
        *self.notified.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        eprintln!("{} {message}", "error:".red().bold());
    }
}

impl CliHost {
    fn take(&self, document: &DocumentId) -> Vec<DocumentDiagnostic> {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.shift_remove(document).unwrap_or_default()
    }
    fn notified(&self) -> usize {
        *self.notified.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl InputSettings {
    fn load_config(&self) -> Result<Config> {
        match self.config.as_ref() {
            Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display())),
            None => Ok(Config::default()),
        }
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let text = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let id = std::path::absolute(&source_path).unwrap_or(source_path);
            out.push(Document::json(id, text));
        }
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_tracing(&self) {
        let filter = if self.verbose {
            EnvFilter::new("json_conform=debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Tag(target) => {
                for document in target.input_settings.load_documents()? {
                    let name = display_name(&document.id);
                    match tag::extract(&document.text) {
                        Some(tag) => println!("{name}: {} from {}", tag.import.bold(), tag.from),
                        None => println!("{name}: {}", "untagged".yellow()),
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Artifact(target) => {
                let config = target.input_settings.load_config()?;
                for document in target.input_settings.load_documents()? {
                    match tag::extract(&document.text) {
                        Some(tag) => {
                            let artifact = artifact::synthesize(
                                &document.id,
                                &document.text,
                                &tag,
                                &config.artifact_file_name,
                            );
                            println!("// {}", artifact.path.display());
                            println!("{}", artifact.content);
                        }
                        None => eprintln!("{}: {}", display_name(&document.id), "untagged".yellow()),
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Check(target) => {
                let mut config = target.input_settings.load_config()?;
                config.mode = target.mode.into();
                if target.report_unsupported {
                    config.unsupported_types = UnsupportedTypes::Report;
                }
                let documents = target.input_settings.load_documents()?;

                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("failed to start async runtime")?;
                let clean = runtime.block_on(check_documents(config, documents));
                Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
            }
        }
    }
}

// one document at a time: documents in one directory share the artifact file
async fn check_documents(config: Config, documents: Vec<Document>) -> bool {
    let host = Arc::new(CliHost::default());
    let services = Collaborators {
        checker: Arc::new(CommandChecker::new(&config.checker)),
        fs: Arc::new(TokioFs),
        host: host.clone(),
        resolver: Arc::new(ModuleResolver),
        language: Arc::new(NoLanguageService),
    };
    let orchestrator = Orchestrator::new(config, services);

    let mut clean = true;
    for document in documents {
        let name = display_name(&document.id);
        let outcome = orchestrator.validate(&document).await;
        match outcome {
            Outcome::Untagged => println!("{name}: {}", "untagged, skipped".yellow()),
            Outcome::Skipped | Outcome::Superseded => {}
            Outcome::Failed => clean = false,
            Outcome::Published { declaration_errors, .. } => {
                let diagnostics = host.take(&document.id);
                if diagnostics.is_empty() && declaration_errors == 0 {
                    println!("{name}: {}", "ok".green());
                }
                for diagnostic in &diagnostics {
                    let start = diagnostic.range.start;
                    println!(
                        "{name}:{}:{}: {} {}",
                        start.line + 1,
                        start.character + 1,
                        "error:".red().bold(),
                        diagnostic.message
                    );
                }
                clean &= diagnostics.is_empty() && declaration_errors == 0;
            }
        }
    }
    clean && host.notified() == 0
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn display_name(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
