//! Build settings: TOML config file, CLI merge, validation.
//!
//! Settings come from a flat TOML file (default `soho.toml`), overridden by
//! CLI flags, with stock defaults filling every gap:
//!
//! ```toml
//! # All settings are optional — defaults shown.
//!
//! src_dir = "src"              # Content source tree
//! out_dir = "www"              # Output tree
//! asset_dir = ""               # Static assets; "" = no asset walk
//! template_dir = "templates"   # Where page templates live
//! template = "page.html"       # Template filename within template_dir
//! locale_dir = ""              # Translation catalogs; "" = none
//! base_url = "https://example.com"
//! sitemap = "sitemap.xml"      # "" disables sitemap generation
//! hide_index_html = true       # Strip index.html from URLs
//! ignore_files = ['.*\.DS_Store$', '.*~$']
//! logger_level = "info"        # debug | info | warning | error
//! logger_path = "-"            # "-" = stderr, else an absolute file path
//! assets_only = false
//! force = false
//! do_nothing = false           # Dry run
//! ```
//!
//! Path settings beginning with `./` are resolved relative to the config
//! file's directory; everything else is taken as absolute or relative to
//! the working directory. Unknown keys are rejected to catch typos early.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

/// Config file looked up when `-c` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "soho.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not find file or directory: {0}")]
    Missing(PathBuf),
    #[error("reading config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("the `src_dir` setting cannot be empty")]
    EmptySrcDir,
    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidIgnorePattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("unknown logger level '{0}' (expected debug, info, warning or error)")]
    UnknownLogLevel(String),
    #[error("the path to the log file must be absolute: {0}")]
    RelativeLogPath(PathBuf),
    #[error("resolving path {path}: {source}")]
    ResolvePath {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Raw settings as declared in the config file. Every field has a stock
/// default so sparse files work.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub asset_dir: String,
    pub assets_only: bool,
    pub base_url: String,
    pub do_nothing: bool,
    pub force: bool,
    pub hide_index_html: bool,
    pub locale_dir: String,
    pub ignore_files: Vec<String>,
    pub logger_level: String,
    pub logger_path: String,
    pub out_dir: String,
    pub src_dir: String,
    pub sitemap: String,
    pub template: String,
    pub template_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            asset_dir: String::new(),
            assets_only: false,
            base_url: "https://example.com".to_string(),
            do_nothing: false,
            force: false,
            hide_index_html: true,
            locale_dir: String::new(),
            ignore_files: vec![r".*\.DS_Store$".to_string(), ".*~$".to_string()],
            logger_level: "info".to_string(),
            logger_path: "-".to_string(),
            out_dir: "www".to_string(),
            src_dir: "src".to_string(),
            sitemap: "sitemap.xml".to_string(),
            template: "page.html".to_string(),
            template_dir: "templates".to_string(),
        }
    }
}

impl Settings {
    /// Load the settings file. A missing file is fatal by contract.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay CLI flags. Flags only override when actually set — an
    /// unset `--force` must not clobber `force = true` from the file.
    pub fn apply_cli_flags(&mut self, force: bool, assets_only: bool, dry_run: bool) {
        if force {
            self.force = true;
        }
        if assets_only {
            self.assets_only = true;
        }
        if dry_run {
            self.do_nothing = true;
        }
    }

    /// Resolve raw settings into an immutable [`BuildConfig`], with paths
    /// anchored at `conf_dir` (the config file's directory).
    pub fn resolve(&self, conf_dir: &Path) -> Result<BuildConfig, ConfigError> {
        if self.src_dir.is_empty() {
            return Err(ConfigError::EmptySrcDir);
        }

        let mut ignore_files = Vec::with_capacity(self.ignore_files.len());
        for pattern in &self.ignore_files {
            let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidIgnorePattern {
                pattern: pattern.clone(),
                source: e,
            })?;
            ignore_files.push(re);
        }

        let logging = LogSettings::resolve(&self.logger_level, &self.logger_path)?;

        Ok(BuildConfig {
            src_dir: resolve_path(&self.src_dir, conf_dir)?,
            asset_dir: optional_path(&self.asset_dir, conf_dir)?,
            out_dir: resolve_path(&self.out_dir, conf_dir)?,
            template_dir: resolve_path(&self.template_dir, conf_dir)?,
            template: self.template.clone(),
            locale_dir: optional_path(&self.locale_dir, conf_dir)?,
            base_url: self.base_url.clone(),
            sitemap: (!self.sitemap.is_empty()).then(|| self.sitemap.clone()),
            ignore_files,
            assets_only: self.assets_only,
            force: self.force,
            dry_run: self.do_nothing,
            hide_index_html: self.hide_index_html,
            logging,
        })
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: Level,
    /// `None` logs to stderr (the `-` setting); otherwise an absolute file
    /// path, appended to.
    pub path: Option<PathBuf>,
}

impl LogSettings {
    fn resolve(level: &str, path: &str) -> Result<Self, ConfigError> {
        let level = match level.to_ascii_lowercase().as_str() {
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warning" => Level::WARN,
            "error" => Level::ERROR,
            other => return Err(ConfigError::UnknownLogLevel(other.to_string())),
        };
        let path = if path == "-" {
            None
        } else {
            let path = PathBuf::from(path);
            // The log file location must not depend on the working
            // directory, so we refuse to guess.
            if !path.is_absolute() {
                return Err(ConfigError::RelativeLogPath(path));
            }
            Some(path)
        };
        Ok(Self { level, path })
    }
}

/// Immutable, fully resolved settings for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub src_dir: PathBuf,
    /// `None` when no asset directory is configured.
    pub asset_dir: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub template_dir: PathBuf,
    /// Template filename within `template_dir`.
    pub template: String,
    /// `None` when no locale directory is configured.
    pub locale_dir: Option<PathBuf>,
    /// Base URL prepended to page URLs in the sitemap.
    pub base_url: String,
    /// Sitemap filename within `out_dir`; `None` disables generation.
    pub sitemap: Option<String>,
    /// Paths (relative to the tree root) matching any of these are skipped.
    pub ignore_files: Vec<Regex>,
    pub assets_only: bool,
    pub force: bool,
    pub dry_run: bool,
    pub hide_index_html: bool,
    pub logging: LogSettings,
}

impl BuildConfig {
    /// Check that every configured directory exists. Fatal before any
    /// processing starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut required = vec![&self.src_dir, &self.template_dir];
        if let Some(dir) = &self.asset_dir {
            required.push(dir);
        }
        if let Some(dir) = &self.locale_dir {
            required.push(dir);
        }
        for dir in required {
            if !dir.exists() {
                return Err(ConfigError::Missing(dir.clone()));
            }
        }
        Ok(())
    }

    /// The full path of the page template.
    pub fn template_path(&self) -> PathBuf {
        self.template_dir.join(&self.template)
    }
}

fn resolve_path(setting: &str, conf_dir: &Path) -> Result<PathBuf, ConfigError> {
    // A leading `./` pins the path to the config file's directory.
    let joined = match setting.strip_prefix("./") {
        Some(rest) => conf_dir.join(rest),
        None => PathBuf::from(setting),
    };
    std::path::absolute(&joined).map_err(|e| ConfigError::ResolvePath {
        path: joined,
        source: e,
    })
}

fn optional_path(setting: &str, conf_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    if setting.is_empty() {
        return Ok(None);
    }
    resolve_path(setting, conf_dir).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolve(settings: &Settings) -> BuildConfig {
        settings.resolve(Path::new("/conf")).unwrap()
    }

    #[test]
    fn stock_defaults() {
        let config = resolve(&Settings::default());
        assert!(config.src_dir.ends_with("src"));
        assert!(config.out_dir.ends_with("www"));
        assert_eq!(config.asset_dir, None);
        assert_eq!(config.locale_dir, None);
        assert_eq!(config.sitemap.as_deref(), Some("sitemap.xml"));
        assert_eq!(config.template, "page.html");
        assert!(config.hide_index_html);
        assert!(!config.force);
        assert_eq!(config.ignore_files.len(), 2);
        assert_eq!(config.logging.level, Level::INFO);
        assert_eq!(config.logging.path, None);
    }

    #[test]
    fn sparse_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let conf = dir.path().join("soho.toml");
        fs::write(&conf, "src_dir = \"content\"\n").unwrap();

        let settings = Settings::load(&conf).unwrap();
        assert_eq!(settings.src_dir, "content");
        assert_eq!(settings.out_dir, "www");
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let err = Settings::load(Path::new("/does/not/exist.toml"));
        assert!(matches!(err, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let conf = dir.path().join("soho.toml");
        fs::write(&conf, "sorce_dir = \"typo\"\n").unwrap();
        assert!(matches!(
            Settings::load(&conf),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn dot_slash_paths_resolve_relative_to_config_dir() {
        let settings = Settings {
            src_dir: "./content".to_string(),
            ..Settings::default()
        };
        let config = settings.resolve(Path::new("/projects/site")).unwrap();
        assert_eq!(config.src_dir, PathBuf::from("/projects/site/content"));
    }

    #[test]
    fn plain_relative_paths_resolve_against_cwd() {
        let settings = Settings {
            src_dir: "content".to_string(),
            ..Settings::default()
        };
        let config = settings.resolve(Path::new("/projects/site")).unwrap();
        assert!(config.src_dir.is_absolute());
        assert!(!config.src_dir.starts_with("/projects/site"));
    }

    #[test]
    fn empty_src_dir_is_fatal() {
        let settings = Settings {
            src_dir: String::new(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.resolve(Path::new("/conf")),
            Err(ConfigError::EmptySrcDir)
        ));
    }

    #[test]
    fn empty_sitemap_disables_generation() {
        let settings = Settings {
            sitemap: String::new(),
            ..Settings::default()
        };
        assert_eq!(resolve(&settings).sitemap, None);
    }

    #[test]
    fn invalid_ignore_pattern_is_fatal() {
        let settings = Settings {
            ignore_files: vec!["[unclosed".to_string()],
            ..Settings::default()
        };
        assert!(matches!(
            settings.resolve(Path::new("/conf")),
            Err(ConfigError::InvalidIgnorePattern { .. })
        ));
    }

    #[test]
    fn relative_log_path_is_fatal() {
        let settings = Settings {
            logger_path: "soho.log".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.resolve(Path::new("/conf")),
            Err(ConfigError::RelativeLogPath(_))
        ));
    }

    #[test]
    fn unknown_log_level_is_fatal() {
        let settings = Settings {
            logger_level: "verbose".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.resolve(Path::new("/conf")),
            Err(ConfigError::UnknownLogLevel(_))
        ));
    }

    #[test]
    fn log_level_names_map_to_tracing_levels() {
        for (name, level) in [
            ("debug", Level::DEBUG),
            ("info", Level::INFO),
            ("WARNING", Level::WARN),
            ("Error", Level::ERROR),
        ] {
            let settings = Settings {
                logger_level: name.to_string(),
                ..Settings::default()
            };
            assert_eq!(resolve(&settings).logging.level, level);
        }
    }

    #[test]
    fn cli_flags_override_only_when_set() {
        let mut settings = Settings {
            force: true,
            ..Settings::default()
        };
        settings.apply_cli_flags(false, true, false);
        assert!(settings.force, "unset CLI flag must not clear file value");
        assert!(settings.assets_only);
        assert!(!settings.do_nothing);
    }

    #[test]
    fn validate_flags_missing_directories() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("src");
        fs::create_dir_all(&existing).unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();

        let settings = Settings {
            src_dir: existing.to_string_lossy().into_owned(),
            template_dir: dir.path().join("templates").to_string_lossy().into_owned(),
            asset_dir: dir.path().join("missing").to_string_lossy().into_owned(),
            ..Settings::default()
        };
        let config = settings.resolve(dir.path()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn validate_passes_when_directories_exist() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();

        let settings = Settings {
            src_dir: dir.path().join("src").to_string_lossy().into_owned(),
            template_dir: dir.path().join("templates").to_string_lossy().into_owned(),
            ..Settings::default()
        };
        let config = settings.resolve(dir.path()).unwrap();
        assert!(config.validate().is_ok());
    }
}
