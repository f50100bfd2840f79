//! Passthrough generator: HTML in, the same HTML out.

use std::path::Path;

use crate::generators::{GenerateError, Generator, read_source};
use crate::metadata::{self, Metadata};

/// Hands the file content through unchanged; metadata comes from the
/// sibling `.meta.toml` document alone.
#[derive(Debug, Default)]
pub struct HtmlGenerator;

impl Generator for HtmlGenerator {
    fn generate(&self, path: &Path) -> Result<(Metadata, String), GenerateError> {
        let meta = metadata::read_file_metadata(path)?;
        let body = read_source(path)?;
        Ok((meta, body))
    }
}
