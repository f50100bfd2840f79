//! Markdown generator: converts Markdown to an HTML fragment with
//! pulldown-cmark.
//!
//! Metadata comes from two places, embedded winning over sidecar per key:
//!
//! 1. the sibling `.meta.toml` document, shared with every generator;
//! 2. an optional TOML front matter block fenced by `+++` lines at the very
//!    top of the file:
//!
//! ```text
//! +++
//! title = "Hello"
//! locale = "fr"
//! +++
//! # Heading
//!
//! Body text.
//! ```

use std::path::Path;

use pulldown_cmark::{Parser, html as md_html};

use crate::generators::{GenerateError, Generator, read_source};
use crate::metadata::{self, Metadata};

const FRONT_MATTER_FENCE: &str = "+++";

/// Converts Markdown source files into HTML fragments.
#[derive(Debug, Default)]
pub struct MarkdownGenerator;

impl Generator for MarkdownGenerator {
    fn generate(&self, path: &Path) -> Result<(Metadata, String), GenerateError> {
        let source = read_source(path)?;
        let (front_matter, body) = split_front_matter(&source);

        let mut meta = metadata::read_file_metadata(path)?;
        if let Some(raw) = front_matter {
            let embedded: Metadata =
                toml::from_str(raw).map_err(|e| GenerateError::FrontMatter {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            metadata::overlay(&mut meta, embedded);
        }

        let parser = Parser::new(body);
        let mut fragment = String::new();
        md_html::push_html(&mut fragment, parser);
        Ok((meta, fragment.trim().to_string()))
    }
}

/// Split an optional leading `+++`-fenced TOML block from the body.
///
/// The opening fence must be the first line of the file. Without a closing
/// fence the whole file is treated as body.
fn split_front_matter(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source.strip_prefix(FRONT_MATTER_FENCE) else {
        return (None, source);
    };
    let Some(rest) = rest.strip_prefix('\n') else {
        return (None, source);
    };
    match rest.split_once(&format!("\n{FRONT_MATTER_FENCE}")) {
        Some((raw, body)) => (Some(raw), body.trim_start_matches('\n')),
        None => (None, source),
    }
}
