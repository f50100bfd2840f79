//! The build driver.
//!
//! [`Builder`] walks the asset tree (copy-only) and the source tree
//! (convert + render), deciding for every file whether it must be
//! (re)generated. Everything downstream — markup conversion, template
//! rendering, translation lookups — is delegated through the
//! [registry](crate::registry) and the [i18n](crate::i18n) wrapper.
//!
//! ## Per-file decisions
//!
//! A file is *ignored* (never visited, never copied) when its path relative
//! to the tree root matches an ignore pattern, or — in the source walk —
//! when it is a metadata document. A surviving file is regenerated only
//! when `force` is set, the output is missing, or the source is strictly
//! newer than the output; this mtime comparison is the system's only
//! caching mechanism, so re-running against unchanged trees is a no-op.
//!
//! Sitemap entries are recorded for every visited page-producing file
//! *before* the up-to-date check: the sitemap always reflects the full
//! mapped set, independent of what this particular run rewrote.
//!
//! ## Dry runs
//!
//! `dry_run` suppresses every side effect (no directories, no writes, no
//! copies) while keeping all decision-making, logging, and sitemap
//! accumulation, so a dry run reports exactly what a real run would do.
//! Output directories are created lazily, just before something is written
//! into them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::generators::GenerateError;
use crate::i18n::{I18nError, Translations, interpolate};
use crate::metadata::{self, METADATA_SUFFIX, Metadata, MetadataError};
use crate::registry::Registry;
use crate::renderers::{Bindings, RenderError, TranslateFn, TranslateRequest};
use crate::sitemap::{Sitemap, SitemapError};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Sitemap(#[from] SitemapError),
    #[error(transparent)]
    I18n(#[from] I18nError),
}

fn io_err(context: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> BuildError {
    let path = path.to_path_buf();
    move |source| BuildError::Io {
        context,
        path,
        source,
    }
}

/// What one build run did (or, under `dry_run`, would have done).
///
/// Files whose extension has no registered generator are copied verbatim
/// and counted in `files_copied`, distinct from rendered pages — useful
/// for spotting unhandled file types in a source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages_rendered: usize,
    pub files_copied: usize,
    pub assets_copied: usize,
    pub up_to_date: usize,
    pub sitemap_written: bool,
}

/// Orchestrates one build: traversal, metadata inheritance, up-to-date
/// gating, generator/renderer invocation, and output writing.
pub struct Builder {
    config: BuildConfig,
    registry: Registry,
    translations: Arc<Translations>,
    sitemap: Option<Sitemap>,
    changed: bool,
    report: BuildReport,
}

impl Builder {
    /// Load translation catalogs and prepare the sitemap accumulator.
    pub fn new(config: BuildConfig, registry: Registry) -> Result<Self, BuildError> {
        let translations = match &config.locale_dir {
            Some(dir) => Translations::load(dir)?,
            None => Translations::empty(),
        };
        let sitemap = config.sitemap.is_some().then(Sitemap::new);
        Ok(Self {
            config,
            registry,
            translations: Arc::new(translations),
            sitemap,
            changed: false,
            report: BuildReport::default(),
        })
    }

    /// Run the build: assets first, then the source tree, then the sitemap.
    pub fn build(mut self) -> Result<BuildReport, BuildError> {
        if self.config.dry_run {
            tracing::info!("dry run: no file or directory will be created");
        }
        if let Some(asset_dir) = self.config.asset_dir.clone() {
            tracing::info!("copying assets");
            self.copy_assets(&asset_dir)?;
        }
        if !self.config.assets_only {
            tracing::info!("building pages");
            let root = self.config.src_dir.clone();
            self.process_source_dir(&root, &root, &Metadata::new())?;
        }
        self.write_sitemap()?;
        tracing::info!("done");
        Ok(self.report)
    }

    // ------------------------------------------------------------------
    // Asset walk
    // ------------------------------------------------------------------

    fn copy_assets(&mut self, asset_dir: &Path) -> Result<(), BuildError> {
        // Ignored directories are pruned so their contents are never
        // visited. Entries are collected up front because the prune
        // closure borrows the ignore patterns.
        let files: Vec<PathBuf> = {
            let patterns = &self.config.ignore_files;
            WalkDir::new(asset_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    let rel = entry.path().strip_prefix(asset_dir).unwrap_or(entry.path());
                    if rel.as_os_str().is_empty() {
                        return true;
                    }
                    let rel = slash_path(rel);
                    if patterns.iter().any(|re| re.is_match(&rel)) {
                        tracing::debug!(path = %entry.path().display(), "ignoring");
                        return false;
                    }
                    true
                })
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect()
        };

        for path in files {
            let Ok(rel) = path.strip_prefix(asset_dir) else {
                continue;
            };
            let out_path = self.config.out_dir.join(rel);
            if !self.should_overwrite(&out_path, &path)? {
                tracing::debug!(path = %out_path.display(), "not overwriting, up to date");
                self.report.up_to_date += 1;
                continue;
            }
            tracing::info!(
                from = %path.display(),
                to = %out_path.display(),
                "copying asset"
            );
            if !self.config.dry_run {
                ensure_parent_dir(&out_path)?;
                std::fs::copy(&path, &out_path).map_err(io_err("copying", &path))?;
            }
            self.report.assets_copied += 1;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Source walk
    // ------------------------------------------------------------------

    fn process_source_dir(
        &mut self,
        root: &Path,
        dir: &Path,
        inherited: &Metadata,
    ) -> Result<(), BuildError> {
        // Each level gets its own copy of the inherited map: sibling
        // subtrees must never observe each other's overrides.
        let mut dir_meta = inherited.clone();
        metadata::overlay(&mut dir_meta, metadata::read_dir_metadata(dir)?);

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(io_err("reading directory", dir))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        for path in entries {
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            if self.is_ignored(rel) {
                tracing::debug!(path = %path.display(), "ignoring");
                continue;
            }
            if path.is_dir() {
                self.process_source_dir(root, &path, &dir_meta)?;
            } else {
                self.process_source_file(&path, rel, &dir_meta)?;
            }
        }
        Ok(())
    }

    /// Ignore rule for the source walk: metadata documents and anything
    /// matching an ignore pattern, checked against the tree-relative path.
    fn is_ignored(&self, rel: &Path) -> bool {
        let rel = slash_path(rel);
        rel.ends_with(METADATA_SUFFIX)
            || self.config.ignore_files.iter().any(|re| re.is_match(&rel))
    }

    fn process_source_file(
        &mut self,
        path: &Path,
        rel: &Path,
        dir_meta: &Metadata,
    ) -> Result<(), BuildError> {
        let generator = self.registry.generator_for(path);

        // A recognized extension turns into .html in both the output path
        // and the URL.
        let mut out_rel = rel.to_path_buf();
        if generator.is_some() {
            out_rel.set_extension("html");
        }

        let mut url = slash_path(&out_rel);
        if self.config.hide_index_html {
            url = hide_index_html_from(&url).to_string();
        }
        if !url.starts_with('/') {
            url.insert(0, '/');
        }

        // Recorded before the up-to-date check on purpose: the sitemap
        // lists every file that maps to a page, not just the ones this
        // run rewrote.
        if let Some(sitemap) = &mut self.sitemap {
            let full_url = format!("{}{}", self.config.base_url, url);
            sitemap.add(path, full_url, "monthly", 0.5)?;
        }

        let out_path = self.config.out_dir.join(&out_rel);
        if !self.should_overwrite(&out_path, path)? {
            tracing::debug!(path = %out_path.display(), "not overwriting, up to date");
            self.report.up_to_date += 1;
            return Ok(());
        }

        let Some(generator) = generator else {
            tracing::info!(
                path = %path.display(),
                "no generator for this extension, copying as is"
            );
            if !self.config.dry_run {
                ensure_parent_dir(&out_path)?;
                std::fs::copy(path, &out_path).map_err(io_err("copying", path))?;
            }
            self.report.files_copied += 1;
            return Ok(());
        };

        self.changed = true;
        tracing::info!(from = %path.display(), to = %out_path.display(), "processing");

        let (file_meta, fragment) = generator.generate(path)?;
        let mut md = dir_meta.clone();
        metadata::overlay(&mut md, file_meta);
        // Injected last: user metadata can never override the computed path.
        md.insert("path".to_string(), toml::Value::String(url));

        let renderer = self
            .registry
            .renderer_for(&self.config.template_path(), self.translate_fn())?;
        let html = renderer.render(&Bindings {
            body: fragment,
            md,
            assets: "/assets".to_string(),
        })?;

        if !self.config.dry_run {
            ensure_parent_dir(&out_path)?;
            std::fs::write(&out_path, html.as_bytes()).map_err(io_err("writing", &out_path))?;
        }
        self.report.pages_rendered += 1;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared decisions
    // ------------------------------------------------------------------

    /// Regenerate unless the output exists and is at least as new as the
    /// source. `force` wins over everything.
    fn should_overwrite(&self, out_path: &Path, src_path: &Path) -> Result<bool, BuildError> {
        if self.config.force {
            return Ok(true);
        }
        let out_meta = match std::fs::metadata(out_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(io_err("inspecting", out_path)(e)),
        };
        let out_mtime = out_meta
            .modified()
            .map_err(io_err("inspecting", out_path))?;
        let src_mtime = std::fs::metadata(src_path)
            .and_then(|m| m.modified())
            .map_err(io_err("inspecting", src_path))?;
        Ok(src_mtime > out_mtime)
    }

    /// The translation callback handed to renderers, bound to this build's
    /// catalogs. Without a page locale it interpolates and consults no
    /// catalog.
    fn translate_fn(&self) -> TranslateFn {
        let translations = Arc::clone(&self.translations);
        Arc::new(move |req: &TranslateRequest<'_>| match req.locale {
            Some(locale) => {
                translations.translate(locale, req.msgid, req.domain.unwrap_or(""), req.mapping)
            }
            None => interpolate(req.default.unwrap_or(req.msgid), req.mapping),
        })
    }

    fn write_sitemap(&mut self) -> Result<(), BuildError> {
        let (Some(sitemap), Some(name)) = (&self.sitemap, &self.config.sitemap) else {
            return Ok(());
        };
        if !self.changed && !self.config.force {
            return Ok(());
        }
        let path = self.config.out_dir.join(name);
        tracing::info!(path = %path.display(), entries = sitemap.len(), "writing sitemap");
        if !self.config.dry_run {
            std::fs::create_dir_all(&self.config.out_dir)
                .map_err(io_err("creating directory", &self.config.out_dir))?;
            let mut file = std::fs::File::create(&path).map_err(io_err("writing", &path))?;
            sitemap.write(&mut file).map_err(io_err("writing", &path))?;
        }
        self.report.sitemap_written = true;
        Ok(())
    }
}

/// Create the output-side parent directory of `path` on demand.
fn ensure_parent_dir(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err("creating directory", parent))?;
    }
    Ok(())
}

/// A relative path as a URL-style string with `/` separators.
fn slash_path(path: &Path) -> String {
    path.iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip a trailing `index.html` segment and any trailing slashes.
/// Only a whole final segment counts: `foo/myindex.html` is left alone.
fn hide_index_html_from(url: &str) -> &str {
    match url.strip_suffix("index.html") {
        Some(rest) if rest.is_empty() || rest.ends_with('/') => rest.trim_end_matches('/'),
        _ => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_index_html_basics() {
        assert_eq!(hide_index_html_from("foo"), "foo");
        assert_eq!(hide_index_html_from("index.html"), "");
        assert_eq!(hide_index_html_from("/index.html"), "");
        assert_eq!(hide_index_html_from("foo/index.html"), "foo");
        assert_eq!(hide_index_html_from("foo/bar.html"), "foo/bar.html");
    }

    #[test]
    fn hide_index_html_requires_a_whole_segment() {
        assert_eq!(hide_index_html_from("foo/myindex.html"), "foo/myindex.html");
        assert_eq!(hide_index_html_from("myindex.html"), "myindex.html");
    }

    #[test]
    fn slash_path_joins_components() {
        assert_eq!(slash_path(Path::new("a/b/c.html")), "a/b/c.html");
        assert_eq!(slash_path(Path::new("c.html")), "c.html");
    }
}
