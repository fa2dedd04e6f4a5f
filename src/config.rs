//! Runtime configuration. Every field has a default; a JSON file may override
//! any subset of them.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::artifact::DEFAULT_FILE_NAME;
use crate::error::{Error, Result};
use crate::indexing::IndexWait;
use crate::matcher::UnsupportedTypes;
use crate::orchestrator::Mode;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// File name of the synthetic artifact, created next to the document.
    pub artifact_file_name: String,
    pub mode: Mode,
    pub index_timeout_ms: u64,
    pub index_poll_interval_ms: u64,
    /// Checker diagnostic codes dropped before remapping.
    pub ignored_codes: Vec<u32>,
    pub unsupported_types: UnsupportedTypes,
    pub checker: CheckerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_file_name: DEFAULT_FILE_NAME.to_string(),
            mode: Mode::Checker,
            index_timeout_ms: 2000,
            index_poll_interval_ms: 500,
            // "An import path can only end with a '.ts' extension when ..."
            ignored_codes: vec![5097],
            unsupported_types: UnsupportedTypes::Permit,
            checker: CheckerConfig::default(),
        }
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            program: "tsc".to_string(),
            args: ["--noEmit", "--pretty", "false", "--allowImportingTsExtensions", "--strict"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    pub fn from_json(src: &str) -> std::result::Result<Self, String> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Self::from_json(&src).map_err(|message| Error::Config { path: path.to_path_buf(), message })
    }

    pub fn index_wait(&self) -> IndexWait {
        IndexWait {
            timeout: Duration::from_millis(self.index_timeout_ms),
            poll_interval: Duration::from_millis(self.index_poll_interval_ms.max(1)),
        }
    }
}
