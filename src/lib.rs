//! # Soho
//!
//! A minimal static site generator driven by per-directory metadata.
//! Your filesystem is the site: the source tree mirrors the output tree,
//! directories carry inheritable TOML metadata, and each content file is
//! converted to an HTML fragment and wrapped in a page template.
//!
//! # Architecture
//!
//! One pass over two trees:
//!
//! ```text
//! assets/   →  www/           (verbatim copy, mtime-gated)
//! src/      →  www/           (convert + render, mtime-gated)
//!              www/sitemap.xml
//! ```
//!
//! The build driver owns every decision — what to visit, what is up to
//! date, what metadata a file inherits, what URL it maps to. Markup
//! conversion, template rendering, and translation lookups are thin
//! adapters over external crates, reached through an extension-keyed
//! registry.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | The driver — traversal, inheritance, up-to-date gating, orchestration |
//! | [`config`] | `soho.toml` loading, CLI merge, path resolution, validation |
//! | [`metadata`] | `.meta.toml` documents and top-down inheritance |
//! | [`registry`] | Extension → generator/renderer factory table |
//! | [`generators`] | HTML passthrough and Markdown (pulldown-cmark) converters |
//! | [`renderers`] | Tera page templates with a `trans()` translation hook |
//! | [`i18n`] | Per-locale/domain TOML catalogs and `${var}` interpolation |
//! | [`sitemap`] | URL accumulation and sitemap-protocol XML output |
//!
//! # Design Decisions
//!
//! ## Timestamps, Not Hashes
//!
//! Incremental builds compare source and output modification times — the
//! output tree itself is the cache. Re-running against unchanged trees
//! performs zero writes, and `--force` is the only cache-bust switch.
//! No manifest files, no content hashing, nothing to corrupt.
//!
//! ## Metadata Is Data
//!
//! Per-directory and per-file metadata are plain TOML documents. They are
//! parsed, never executed, and inherit by map overlay: a child starts from
//! a copy of its parent's keys and overwrites the ones it declares.
//!
//! ## Declarative Sitemap Semantics
//!
//! Sitemap entries are recorded for every visited page-producing file,
//! before the up-to-date check. The sitemap describes the site's URL set,
//! not what one particular incremental run happened to rewrite.
//!
//! ## Graceful Degradation Over Hard Failure
//!
//! A file with no registered generator is copied verbatim; a missing
//! translation falls back to the original message with placeholders
//! interpolated. Only startup problems — missing directories, malformed
//! config — abort a run.

pub mod build;
pub mod config;
pub mod generators;
pub mod i18n;
pub mod metadata;
pub mod registry;
pub mod renderers;
pub mod sitemap;
