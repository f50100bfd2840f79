use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use soho::build::Builder;
use soho::config::{self, LogSettings, Settings};
use soho::registry::Registry;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "soho")]
#[command(about = "Static site generator driven by per-directory metadata")]
#[command(long_about = "\
Static site generator driven by per-directory metadata

Your filesystem is the site. The source tree mirrors the output tree,
directories carry inheritable metadata, and each content file is converted
to an HTML fragment and wrapped in a page template.

Site structure:

  soho.toml                        # Build settings (src_dir, out_dir, ...)
  src/
  ├── .meta.toml                   # Directory metadata, inherited downward
  ├── index.html                   # Passed through, wrapped in the template
  ├── about.md                     # Converted from Markdown
  ├── about.md.meta.toml           # Per-file metadata overlay
  └── docs/
      ├── .meta.toml               # Overlays the parent's keys
      └── guide.md
  assets/                          # Copied verbatim to the output tree
  templates/
  └── page.html                    # Tera template: body, md, assets, trans()
  locale/
  └── fr/
      └── site.toml                # Translation catalog, one file per domain

Files whose extension has no generator are copied byte-for-byte. Outputs
are regenerated only when the source is newer, unless --force is given.")]
#[command(version = version_string())]
struct Cli {
    /// Settings file to use
    #[arg(
        short = 'c',
        value_name = "CONFIG-FILE",
        default_value = config::DEFAULT_CONFIG_FILE
    )]
    config_file: PathBuf,

    /// Regenerate everything, even files that are up to date
    #[arg(short, long)]
    force: bool,

    /// Process only assets (useful when just a stylesheet changed)
    #[arg(short, long)]
    assets_only: bool,

    /// Dry run: decide and report, but create or copy nothing
    #[arg(short, long, alias = "do-nothing")]
    dry_run: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("soho: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let conf_path = std::path::absolute(&cli.config_file)?;
    let conf_dir = conf_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let mut settings = Settings::load(&conf_path)?;
    settings.apply_cli_flags(cli.force, cli.assets_only, cli.dry_run);
    let build_config = settings.resolve(&conf_dir)?;

    init_logging(&build_config.logging)?;
    build_config.validate()?;

    let registry = Registry::with_default_plugins();
    let builder = Builder::new(build_config, registry)?;
    let report = builder.build()?;

    tracing::info!(
        pages = report.pages_rendered,
        copied = report.files_copied,
        assets = report.assets_copied,
        up_to_date = report.up_to_date,
        sitemap = report.sitemap_written,
        "build finished"
    );
    Ok(())
}

/// Install the global subscriber: stderr by default, or an appended-to
/// absolute log file when `logger_path` names one.
fn init_logging(settings: &LogSettings) -> Result<(), Box<dyn std::error::Error>> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(settings.level)
        .with_target(false);
    match &settings.path {
        None => builder.with_writer(std::io::stderr).init(),
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
    }
    Ok(())
}
