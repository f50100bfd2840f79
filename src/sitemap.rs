//! Sitemap accumulation and serialization.
//!
//! The build driver records one entry per source file that maps to a URL,
//! then serializes them as a sitemap-protocol XML document
//! (<https://www.sitemaps.org/>) at the end of the run.
//!
//! Entries are collected in traversal order, which is not guaranteed to be
//! stable across filesystems, so `write` sorts by URL before emitting —
//! reproducible builds need byte-identical sitemaps.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("reading modification time of {path}: {source}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    url: String,
    last_mod: String,
    change_freq: String,
    priority: f32,
}

/// Accumulates URL records during a build.
#[derive(Debug, Default)]
pub struct Sitemap {
    entries: Vec<Entry>,
}

impl Sitemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a URL backed by the source file at `path`.
    ///
    /// The entry's `lastmod` is the source file's modification time,
    /// formatted `YYYY-MM-DD` in local time.
    pub fn add(
        &mut self,
        path: &Path,
        url: String,
        change_freq: &str,
        priority: f32,
    ) -> Result<(), SitemapError> {
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| SitemapError::Stat {
                path: path.to_path_buf(),
                source: e,
            })?;
        let last_mod = DateTime::<Local>::from(mtime).format("%Y-%m-%d").to_string();
        self.entries.push(Entry {
            url,
            last_mod,
            change_freq: change_freq.to_string(),
            priority,
        });
        Ok(())
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize all entries as a `<urlset>` document, sorted by URL.
    pub fn write(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n")?;
        write!(
            out,
            "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"
        )?;
        let mut sorted: Vec<&Entry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.url.cmp(&b.url));
        for entry in sorted {
            write!(
                out,
                "\n  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    \
                 <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
                entry.url, entry.last_mod, entry.change_freq, entry.priority
            )?;
        }
        write!(out, "</urlset>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn entries_sorted_by_url_not_insertion_order() {
        let dir = TempDir::new().unwrap();
        let foo = dir.path().join("foo");
        let bar = dir.path().join("bar");
        fs::write(&foo, "x").unwrap();
        fs::write(&bar, "y").unwrap();

        let mut sitemap = Sitemap::new();
        sitemap
            .add(&foo, "http://example.com/foo".into(), "monthly", 0.5)
            .unwrap();
        sitemap
            .add(&bar, "http://example.com/bar".into(), "weekly", 0.4)
            .unwrap();

        let mut out = Vec::new();
        sitemap.write(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        let bar_pos = xml.find("http://example.com/bar").unwrap();
        let foo_pos = xml.find("http://example.com/foo").unwrap();
        assert!(bar_pos < foo_pos, "entries must be sorted by URL");
    }

    #[test]
    fn document_shape() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("page");
        fs::write(&page, "x").unwrap();

        let mut sitemap = Sitemap::new();
        sitemap
            .add(&page, "http://example.com/page".into(), "monthly", 0.5)
            .unwrap();

        let mut out = Vec::new();
        sitemap.write(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<loc>http://example.com/page</loc>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(xml.ends_with("</urlset>"));
    }

    #[test]
    fn lastmod_uses_file_mtime() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("page");
        fs::write(&page, "x").unwrap();

        let mut sitemap = Sitemap::new();
        sitemap
            .add(&page, "http://example.com/page".into(), "monthly", 0.5)
            .unwrap();

        let mut out = Vec::new();
        sitemap.write(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        // The file was just created, so lastmod is today.
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert!(xml.contains(&format!("<lastmod>{today}</lastmod>")));
    }

    #[test]
    fn missing_source_file_errors() {
        let mut sitemap = Sitemap::new();
        let err = sitemap.add(
            Path::new("/does/not/exist"),
            "http://example.com/x".into(),
            "monthly",
            0.5,
        );
        assert!(matches!(err, Err(SitemapError::Stat { .. })));
    }

    #[test]
    fn empty_sitemap_is_a_bare_urlset() {
        let sitemap = Sitemap::new();
        let mut out = Vec::new();
        sitemap.write(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.ends_with("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\"></urlset>"));
    }
}
