//! Content generators: source file → metadata + HTML fragment.
//!
//! A generator turns one source file into the `(metadata, body)` pair the
//! build driver feeds to the page template. Generators are looked up by
//! file extension through the [registry](crate::registry); a file whose
//! extension has no generator is copied to the output tree verbatim.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metadata::{Metadata, MetadataError};

pub mod html;
pub mod markdown;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("reading source file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("parsing front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Converts one source content file into an HTML fragment plus metadata.
pub trait Generator {
    fn generate(&self, path: &Path) -> Result<(Metadata, String), GenerateError>;
}

fn read_source(path: &Path) -> Result<String, GenerateError> {
    std::fs::read_to_string(path).map_err(|e| GenerateError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
