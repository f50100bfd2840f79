//! Tera template renderer.
//!
//! Loads a single template file and renders it against the page bindings.
//! Templates call `trans()` to request translations:
//!
//! ```text
//! <title>{{ trans(msgid="Web site", domain="site") }}</title>
//! <p>{{ trans(msgid="My name is ${name}.", domain="site", name=md.author) }}</p>
//! ```
//!
//! `msgid` is required; `domain` and `default` are optional; every other
//! named argument becomes a `${var}` substitution value.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::{Context, Tera, Value};

use crate::i18n::Mapping;
use crate::renderers::{Bindings, RenderError, Renderer, TranslateFn, TranslateRequest};

const TEMPLATE_NAME: &str = "page";

/// Renders pages through a Tera template file.
pub struct TeraRenderer {
    path: PathBuf,
    source: String,
    translate: TranslateFn,
}

impl TeraRenderer {
    /// Read the template file eagerly so a missing or unreadable template
    /// fails at construction, not mid-render.
    pub fn new(path: &Path, translate: TranslateFn) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|e| RenderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            source,
            translate,
        })
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, bindings: &Bindings) -> Result<String, RenderError> {
        let locale = bindings
            .md
            .get("locale")
            .and_then(|v| v.as_str())
            .map(str::to_owned);

        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, &self.source)
            .map_err(|e| self.template_error(e))?;
        tera.register_function("trans", trans_function(self.translate.clone(), locale));

        let mut context = Context::new();
        context.insert("body", &bindings.body);
        context.insert("md", &bindings.md);
        context.insert("assets", &bindings.assets);

        tera.render(TEMPLATE_NAME, &context)
            .map_err(|e| self.template_error(e))
    }
}

impl TeraRenderer {
    fn template_error(&self, source: tera::Error) -> RenderError {
        RenderError::Template {
            path: self.path.clone(),
            source,
        }
    }
}

/// Build the `trans()` template function bound to this page's locale.
fn trans_function(
    translate: TranslateFn,
    locale: Option<String>,
) -> impl tera::Function + 'static {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let msgid = args
            .get("msgid")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("trans() requires a string `msgid` argument"))?;
        let domain = args.get("domain").and_then(Value::as_str);
        let default = args.get("default").and_then(Value::as_str);

        let mut mapping = Mapping::new();
        for (key, value) in args {
            if matches!(key.as_str(), "msgid" | "domain" | "default") {
                continue;
            }
            let substituted = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            mapping.insert(key.clone(), substituted);
        }

        let request = TranslateRequest {
            msgid,
            domain,
            mapping: &mapping,
            default,
            locale: locale.as_deref(),
        };
        Ok(Value::String((translate)(&request)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::interpolate;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// A translate callback that mirrors the driver's no-catalog fallback.
    fn interpolating_translate() -> TranslateFn {
        Arc::new(|req: &TranslateRequest<'_>| interpolate(req.msgid, req.mapping))
    }

    fn bindings(body: &str, md_toml: &str) -> Bindings {
        Bindings {
            body: body.to_string(),
            md: toml::from_str(md_toml).unwrap(),
            assets: "/assets".to_string(),
        }
    }

    #[test]
    fn renders_body_md_and_assets() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.html");
        fs::write(
            &template,
            "<h1>{{ md.title }}</h1>\n{{ body }}\n<link href=\"{{ assets }}/site.css\">\n",
        )
        .unwrap();

        let renderer = TeraRenderer::new(&template, interpolating_translate()).unwrap();
        let html = renderer
            .render(&bindings("<p>content</p>", "title = \"Hello\""))
            .unwrap();

        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>content</p>"));
        assert!(html.contains("/assets/site.css"));
    }

    #[test]
    fn trans_interpolates_mapping_arguments() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.html");
        fs::write(
            &template,
            "{{ trans(msgid=\"My name is ${name}.\", name=\"John\") }}",
        )
        .unwrap();

        let renderer = TeraRenderer::new(&template, interpolating_translate()).unwrap();
        let html = renderer.render(&bindings("", "")).unwrap();
        assert_eq!(html, "My name is John.");
    }

    #[test]
    fn trans_passes_page_locale_from_metadata() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.html");
        fs::write(&template, "{{ trans(msgid=\"Web site\", domain=\"site\") }}").unwrap();

        let translate: TranslateFn = Arc::new(|req: &TranslateRequest<'_>| {
            format!("{}@{}", req.msgid, req.locale.unwrap_or("none"))
        });

        let renderer = TeraRenderer::new(&template, translate).unwrap();
        let html = renderer.render(&bindings("", "locale = \"fr\"")).unwrap();
        assert_eq!(html, "Web site@fr");

        let renderer =
            TeraRenderer::new(&template, interpolating_translate()).unwrap();
        let html = renderer.render(&bindings("", "")).unwrap();
        assert_eq!(html, "Web site");
    }

    #[test]
    fn missing_template_fails_at_construction() {
        let err = TeraRenderer::new(Path::new("/does/not/exist.html"), interpolating_translate());
        assert!(matches!(err, Err(RenderError::Io { .. })));
    }

    #[test]
    fn trans_without_msgid_is_a_render_error() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.html");
        fs::write(&template, "{{ trans(domain=\"site\") }}").unwrap();

        let renderer = TeraRenderer::new(&template, interpolating_translate()).unwrap();
        assert!(matches!(
            renderer.render(&bindings("", "")),
            Err(RenderError::Template { .. })
        ));
    }

    #[test]
    fn body_is_not_escaped_wholesale() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.html");
        fs::write(&template, "{{ body | safe }}").unwrap();

        let renderer = TeraRenderer::new(&template, interpolating_translate()).unwrap();
        let html = renderer.render(&bindings("<p>raw</p>", "")).unwrap();
        assert_eq!(html, "<p>raw</p>");
    }
}
