//! External checker driven through its command line (`tsc`-style output).
//!
//! Lines look like `path(line,col): error TS2322: message`; indented lines
//! that follow continue the previous message. Line and column are one-based
//! on the wire and zero-based here. The CLI output carries no span width, so
//! every diagnostic gets a length of one character.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::config::CheckerConfig;
use crate::error::{Error, Result};
use crate::remap::CheckerDiagnostic;
use crate::service::{CheckReport, TypeChecker};

static DIAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\): (?:error|warning) TS(?P<code>\d+): (?P<msg>.*)$")
        .expect("diagnostic regex")
});

#[derive(Debug, Clone)]
pub struct CommandChecker {
    program: String,
    args: Vec<String>,
}

impl CommandChecker {
    pub fn new(config: &CheckerConfig) -> Self {
        Self { program: config.program.clone(), args: config.args.clone() }
    }
}

#[async_trait]
impl TypeChecker for CommandChecker {
    async fn check(&self, roots: &[PathBuf]) -> Result<CheckReport> {
        let roots = roots
            .iter()
            .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
            .collect::<Vec<_>>();
        let cwd = roots
            .first()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(&roots)
            .current_dir(&cwd)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Checker(format!("failed to run `{}`: {e}", self.program)))?;

        // a non-zero exit status just means diagnostics were found
        debug!(program = %self.program, status = ?output.status, "checker finished");
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CheckReport { diagnostics: parse_output(&text, &cwd) })
    }
}

/// Parse checker output; relative file paths are resolved against `cwd`.
pub fn parse_output(text: &str, cwd: &Path) -> Vec<CheckerDiagnostic> {
    let mut out: Vec<CheckerDiagnostic> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end();
        if let Some(caps) = DIAG_RE.captures(line) {
            let file = PathBuf::from(&caps["file"]);
            let file = if file.is_absolute() { file } else { cwd.join(file) };
            out.push(CheckerDiagnostic {
                file: Some(file),
                line: caps["line"].parse::<u32>().unwrap_or(1).saturating_sub(1),
                character: caps["col"].parse::<u32>().unwrap_or(1).saturating_sub(1),
                length: 1,
                code: caps["code"].parse().ok(),
                message: caps["msg"].to_string(),
            });
        } else if raw.starts_with(' ') && !line.trim().is_empty() {
            if let Some(last) = out.last_mut() {
                last.message.push('\n');
                last.message.push_str(line.trim());
            }
        }
    }
    out
}
