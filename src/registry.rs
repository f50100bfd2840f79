//! Extension → plugin lookup tables.
//!
//! Generators and renderers are registered under file extensions (no
//! leading dot) by spec string — a double-colon path naming a known
//! implementation, e.g. `soho::generators::markdown::MarkdownGenerator`.
//! Specs resolve against a static table built into the binary; an unknown
//! spec is debug-logged and skipped so missing optional integrations
//! degrade gracefully instead of aborting startup.
//!
//! The registry is an explicit value constructed once per process and
//! passed to the build driver — there is no global registration state.
//! Lookups hand out a fresh instance per use: generators take no
//! constructor arguments, renderers take a template path and a translate
//! callback.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::generators::html::HtmlGenerator;
use crate::generators::markdown::MarkdownGenerator;
use crate::generators::Generator;
use crate::renderers::tera::TeraRenderer;
use crate::renderers::{RenderError, Renderer, TranslateFn};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("at least one extension is required to register a plugin")]
    NoExtensions,
}

type GeneratorFactory = fn() -> Box<dyn Generator>;
type RendererFactory = fn(&Path, TranslateFn) -> Result<Box<dyn Renderer>, RenderError>;

/// Maps file extensions to generator and renderer factories.
#[derive(Default)]
pub struct Registry {
    generators: HashMap<String, GeneratorFactory>,
    renderers: HashMap<String, RendererFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock plugin set: HTML passthrough, Markdown, Tera templates.
    pub fn with_default_plugins() -> Self {
        let mut registry = Self::new();
        // Registration failures are non-fatal by contract, and the stock
        // extension lists are non-empty, so these cannot error.
        let _ = registry.register_generator(
            "soho::generators::html::HtmlGenerator",
            &["html", "htm"],
        );
        let _ = registry.register_generator(
            "soho::generators::markdown::MarkdownGenerator",
            &["md", "markdown"],
        );
        let _ = registry
            .register_renderer("soho::renderers::tera::TeraRenderer", &["html", "tera"]);
        registry
    }

    /// Register a generator under one or more extensions.
    ///
    /// An unresolvable spec leaves the registry untouched for those
    /// extensions; zero extensions is an error.
    pub fn register_generator(
        &mut self,
        spec: &str,
        extensions: &[&str],
    ) -> Result<(), RegistryError> {
        if extensions.is_empty() {
            return Err(RegistryError::NoExtensions);
        }
        let Some(factory) = resolve_generator(spec) else {
            tracing::debug!(spec, "could not resolve generator plugin");
            return Ok(());
        };
        for ext in extensions {
            self.generators.insert((*ext).to_string(), factory);
        }
        Ok(())
    }

    /// Register a renderer under one or more template extensions.
    pub fn register_renderer(
        &mut self,
        spec: &str,
        extensions: &[&str],
    ) -> Result<(), RegistryError> {
        if extensions.is_empty() {
            return Err(RegistryError::NoExtensions);
        }
        let Some(factory) = resolve_renderer(spec) else {
            tracing::debug!(spec, "could not resolve renderer plugin");
            return Ok(());
        };
        for ext in extensions {
            self.renderers.insert((*ext).to_string(), factory);
        }
        Ok(())
    }

    /// A fresh generator for the given source file, chosen by extension.
    pub fn generator_for(&self, path: &Path) -> Option<Box<dyn Generator>> {
        let ext = extension_of(path)?;
        self.generators.get(ext).map(|factory| factory())
    }

    /// A fresh renderer for the given template file, chosen by extension.
    pub fn renderer_for(
        &self,
        template_path: &Path,
        translate: TranslateFn,
    ) -> Result<Box<dyn Renderer>, RenderError> {
        let factory = extension_of(template_path)
            .and_then(|ext| self.renderers.get(ext))
            .ok_or_else(|| RenderError::NoRenderer(template_path.to_path_buf()))?;
        factory(template_path, translate)
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

fn resolve_generator(spec: &str) -> Option<GeneratorFactory> {
    match spec {
        "soho::generators::html::HtmlGenerator" => Some(|| Box::new(HtmlGenerator)),
        "soho::generators::markdown::MarkdownGenerator" => Some(|| Box::new(MarkdownGenerator)),
        _ => None,
    }
}

fn resolve_renderer(spec: &str) -> Option<RendererFactory> {
    match spec {
        "soho::renderers::tera::TeraRenderer" => Some(|path, translate| {
            Ok(Box::new(TeraRenderer::new(path, translate)?) as Box<dyn Renderer>)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderers::TranslateRequest;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn noop_translate() -> TranslateFn {
        Arc::new(|req: &TranslateRequest<'_>| req.msgid.to_string())
    }

    #[test]
    fn default_plugins_cover_stock_extensions() {
        let registry = Registry::with_default_plugins();
        assert!(registry.generator_for(Path::new("a.html")).is_some());
        assert!(registry.generator_for(Path::new("a.htm")).is_some());
        assert!(registry.generator_for(Path::new("a.md")).is_some());
        assert!(registry.generator_for(Path::new("a.markdown")).is_some());
    }

    #[test]
    fn unknown_extension_has_no_generator() {
        let registry = Registry::with_default_plugins();
        assert!(registry.generator_for(Path::new("data.xyz")).is_none());
        assert!(registry.generator_for(Path::new("no-extension")).is_none());
    }

    #[test]
    fn unresolvable_spec_is_skipped() {
        let mut registry = Registry::new();
        registry
            .register_generator("soho::does::not::Exist", &["foo"])
            .unwrap();
        assert!(registry.generator_for(Path::new("a.foo")).is_none());
    }

    #[test]
    fn registering_without_extensions_errors() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register_generator("soho::generators::html::HtmlGenerator", &[]),
            Err(RegistryError::NoExtensions)
        ));
    }

    #[test]
    fn same_generator_under_multiple_extensions() {
        let mut registry = Registry::new();
        registry
            .register_generator("soho::generators::html::HtmlGenerator", &["zpt", "pt"])
            .unwrap();
        assert!(registry.generator_for(Path::new("a.zpt")).is_some());
        assert!(registry.generator_for(Path::new("a.pt")).is_some());
    }

    #[test]
    fn renderer_constructed_per_template() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.html");
        fs::write(&template, "{{ body }}").unwrap();

        let registry = Registry::with_default_plugins();
        assert!(registry.renderer_for(&template, noop_translate()).is_ok());
    }

    #[test]
    fn renderer_lookup_misses_on_unknown_template_extension() {
        let registry = Registry::with_default_plugins();
        let err = registry.renderer_for(Path::new("page.xyz"), noop_translate());
        assert!(matches!(err, Err(RenderError::NoRenderer(_))));
    }
}
