//! Translation catalogs and placeholder interpolation.
//!
//! Catalogs are flat TOML tables, one file per domain, grouped by locale:
//!
//! ```text
//! locale/
//! ├── fr/
//! │   ├── site.toml        # "Web site" = "Site web"
//! │   └── nav.toml
//! └── de/
//!     └── site.toml
//! ```
//!
//! Lookups never fail: an unknown locale, domain, or message id falls back
//! to the original message id, with `${var}` placeholders interpolated from
//! the substitution mapping either way. A build without a locale directory
//! simply runs with an empty catalog set.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum I18nError {
    #[error("reading translation catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing translation catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Substitution values for `${var}` placeholders.
pub type Mapping = BTreeMap<String, String>;

/// Message catalogs indexed by locale, then domain, then message id.
#[derive(Debug, Default)]
pub struct Translations {
    catalogs: HashMap<String, HashMap<String, HashMap<String, String>>>,
}

impl Translations {
    /// An empty catalog set: every lookup falls back to interpolation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `<locale>/<domain>.toml` catalog under `locale_dir`.
    ///
    /// Non-directory entries at the top level and non-TOML files inside a
    /// locale directory are skipped silently.
    pub fn load(locale_dir: &Path) -> Result<Self, I18nError> {
        let mut catalogs = HashMap::new();
        for entry in read_dir(locale_dir)? {
            let locale_path = entry;
            if !locale_path.is_dir() {
                continue;
            }
            let Some(locale) = file_name(&locale_path) else {
                continue;
            };
            let mut domains = HashMap::new();
            for catalog_path in read_dir(&locale_path)? {
                if catalog_path.extension().is_none_or(|e| e != "toml") {
                    continue;
                }
                let Some(domain) = catalog_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_owned)
                else {
                    continue;
                };
                let text =
                    std::fs::read_to_string(&catalog_path).map_err(|e| I18nError::Io {
                        path: catalog_path.clone(),
                        source: e,
                    })?;
                let messages: HashMap<String, String> =
                    toml::from_str(&text).map_err(|e| I18nError::Parse {
                        path: catalog_path.clone(),
                        source: e,
                    })?;
                tracing::debug!(
                    locale,
                    domain,
                    messages = messages.len(),
                    "loaded translation catalog"
                );
                domains.insert(domain, messages);
            }
            catalogs.insert(locale, domains);
        }
        Ok(Self { catalogs })
    }

    /// Translate `msgid` in the requested locale and domain.
    ///
    /// On any miss the original message id is used; `${var}` placeholders
    /// are interpolated from `mapping` in both cases.
    pub fn translate(&self, locale: &str, msgid: &str, domain: &str, mapping: &Mapping) -> String {
        let text = self
            .catalogs
            .get(locale)
            .and_then(|domains| domains.get(domain))
            .and_then(|messages| messages.get(msgid))
            .map(String::as_str)
            .unwrap_or(msgid);
        interpolate(text, mapping)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, I18nError> {
    let entries = std::fs::read_dir(dir).map_err(|e| I18nError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_owned)
}

/// Replace `${key}` placeholders in `text` with values from `mapping`.
/// Placeholders with no matching key are left untouched.
pub fn interpolate(text: &str, mapping: &Mapping) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap());
    re.replace_all(text, |caps: &regex::Captures| {
        match mapping.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}
