use anyhow::Result;
use clap::{Parser, ValueEnum};
use sitewalk_common::observability::{LogConfig, LogFormat, init_logging};
use sitewalk_config::{RunMode, SitewalkConfig, SitewalkConfigLoader};
use std::path::PathBuf;
mod runner;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Scrape,
    Explore,
    Sections,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Scrape => RunMode::Scrape,
            ModeArg::Explore => RunMode::Explore,
            ModeArg::Sections => RunMode::Sections,
        }
    }
}

/// Walk a site through WebDriver and record what it finds.
#[derive(Debug, Parser)]
#[command(name = "sitewalk", version)]
struct Args {
    /// Configuration file; `sitewalk.yaml` is used when present.
    #[arg(short, long, env = "SITEWALK_CONFIG")]
    config: Option<PathBuf>,

    /// Override `run.mode`.
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,

    /// Override `output.dir`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override `run.base_location`.
    #[arg(long)]
    base: Option<String>,
}

fn load_config(args: &Args) -> Result<SitewalkConfig> {
    let loader = match &args.config {
        Some(path) => SitewalkConfigLoader::new().with_file(path),
        None => SitewalkConfigLoader::new().with_optional_file("sitewalk.yaml"),
    };
    let mut cfg = loader.load()?;

    if let Some(mode) = args.mode {
        cfg.run.mode = mode.into();
    }
    if args.headless {
        cfg.browser.headless = true;
    }
    if let Some(dir) = &args.output {
        cfg.output.dir = dir.clone();
    }
    if let Some(base) = &args.base {
        cfg.run.base_location = base.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Load config (env wins over file, flags win over both)
    let cfg = load_config(&args)?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(LogConfig {
        app_name: "sitewalk",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: if cfg.logging.json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::debug!(target: "sitewalk.app", log = %log_path.display(), "logging ready");

    runner::run(cfg).await
}
