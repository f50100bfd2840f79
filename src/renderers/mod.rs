//! Page renderers: template + body fragment + metadata → final HTML.
//!
//! A renderer wraps an external template engine. It is constructed per page
//! from a template file path and a translation callback, then fed the
//! [`Bindings`] the build driver assembles for that page.
//!
//! ## Translation callback
//!
//! Templates may request translations while rendering. The engine adapter
//! forwards each request to a [`TranslateFn`] provided by the build driver,
//! carrying the message id, an optional domain and default text, the
//! substitution mapping, and the page's locale when the page metadata
//! declares one. Without a locale the driver answers with plain `${var}`
//! interpolation and consults no catalog.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::i18n::Mapping;
use crate::metadata::Metadata;

pub mod tera;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("reading template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("rendering template {path}: {source}")]
    Template {
        path: PathBuf,
        source: ::tera::Error,
    },
    #[error("no renderer registered for template {0}")]
    NoRenderer(PathBuf),
}

/// The named values a page template is rendered against.
#[derive(Debug, Clone)]
pub struct Bindings {
    /// HTML fragment produced by the generator.
    pub body: String,
    /// Effective metadata for the page, `path` included.
    pub md: Metadata,
    /// URL prefix under which static assets are served.
    pub assets: String,
}

/// One translation request issued from inside a template.
#[derive(Debug)]
pub struct TranslateRequest<'a> {
    pub msgid: &'a str,
    pub domain: Option<&'a str>,
    pub mapping: &'a Mapping,
    pub default: Option<&'a str>,
    /// The rendered page's locale, when its metadata declares one.
    pub locale: Option<&'a str>,
}

/// Translation callback bound to one build's catalogs.
pub type TranslateFn = Arc<dyn Fn(&TranslateRequest<'_>) -> String + Send + Sync>;

/// Combines a page template, a body fragment, and metadata bindings into
/// final page HTML.
pub trait Renderer {
    fn render(&self, bindings: &Bindings) -> Result<String, RenderError>;
}
