//! Metadata documents and inheritance.
//!
//! Every directory and file in the source tree can carry metadata: small
//! declarative TOML documents holding key/value pairs that end up in the
//! `md` binding passed to the page template.
//!
//! ## Document locations
//!
//! - **Directory metadata**: a `.meta.toml` file directly inside the
//!   directory. Inherited by every descendant.
//! - **File metadata**: a sibling file named after the full filename,
//!   e.g. `about.html.meta.toml` next to `about.html`.
//!
//! ## Inheritance
//!
//! Metadata flows top-down through the tree. A child directory starts from a
//! copy of its parent's map and overlays its own declared keys — last writer
//! wins per key, no deep merge. File metadata overlays directory metadata,
//! generator front matter overlays that, and the computed `path` key is
//! injected last:
//!
//! ```text
//! src/.meta.toml          locale = "fr"      author = "jane"
//! src/docs/.meta.toml     author = "joe"
//! src/docs/a.html         → {locale: "fr", author: "joe", path: "/docs/a.html"}
//! ```
//!
//! Maps are value-copied at each level, so sibling subtrees never observe
//! each other's overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filename suffix identifying metadata documents. Files carrying this
/// suffix are never treated as content by the build driver.
pub const METADATA_SUFFIX: &str = ".meta.toml";

/// An ordered key/value map attached to a directory or file.
///
/// Values are TOML scalars in practice (strings, integers, booleans),
/// though nothing stops a document from declaring tables or arrays.
pub type Metadata = BTreeMap<String, toml::Value>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("reading metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing metadata file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read the metadata document for a content file, if one exists.
///
/// Looks for `<path>.meta.toml` next to the file. A missing document is an
/// empty map, never an error; a malformed one is.
pub fn read_file_metadata(path: &Path) -> Result<Metadata, MetadataError> {
    let mut name = path.as_os_str().to_owned();
    name.push(METADATA_SUFFIX);
    read_document(Path::new(&name))
}

/// Read the metadata document declared by a directory, if one exists.
///
/// Looks for `<dir>/.meta.toml`. Same missing-file contract as
/// [`read_file_metadata`].
pub fn read_dir_metadata(dir: &Path) -> Result<Metadata, MetadataError> {
    read_document(&dir.join(METADATA_SUFFIX))
}

fn read_document(path: &Path) -> Result<Metadata, MetadataError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Metadata::new()),
        Err(e) => {
            return Err(MetadataError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    toml::from_str(&text).map_err(|e| MetadataError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Overlay `upper` onto `base`, key by key. Last writer wins; values are
/// replaced whole, never merged recursively.
pub fn overlay(base: &mut Metadata, upper: Metadata) {
    for (key, value) in upper {
        base.insert(key, value);
    }
}
