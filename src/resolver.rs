//! Type resolution for the matcher.
//!
//! [`ModuleResolver`] reads JSON type modules: an object mapping exported type
//! names to their [`Ty`] description.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ir::Ty;
use crate::service::TypeResolver;
use crate::tag::TypeTag;

pub type TypeModule = IndexMap<String, Ty>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleResolver;

fn source_path(base_dir: &Path, tag: &TypeTag) -> PathBuf {
    base_dir.join(&tag.from)
}

pub fn parse_module(path: &Path, src: &str) -> Result<TypeModule> {
    crate::path_de::from_str_with_path::<TypeModule>(src)
        .map_err(|message| Error::TypeModule { path: path.to_path_buf(), message })
}

#[async_trait]
impl TypeResolver for ModuleResolver {
    async fn resolve(&self, base_dir: &Path, tag: &TypeTag) -> Result<Ty> {
        let path = source_path(base_dir, tag);
        let src = match tokio::fs::read_to_string(&path).await {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::TypeSourceNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        let mut module = parse_module(&path, &src)?;
        debug!(path = %path.display(), exports = module.len(), "loaded type module");
        module
            .swap_remove(&tag.import)
            .ok_or(Error::TypeNotFound { name: tag.import.clone(), source_path: path })
    }
}
