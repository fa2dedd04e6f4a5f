//! Validate tagged JSON documents against external structural types.
//!
//! A document names its type with
//! `"$type": { "$from": "<source>", "$import": "<Type>" }`. Validation either
//! hands a synthesized artifact to an external checker and maps its findings
//! back onto the document, or resolves the type and runs the in-process
//! [`matcher`].
pub mod artifact;
pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod indexing;
pub mod ir;
pub mod locate;
pub mod matcher;
pub mod orchestrator;
pub mod path_de;
pub mod remap;
pub mod resolver;
pub mod service;
pub mod tag;

pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::{Collaborators, Mode, Orchestrator, Outcome};
