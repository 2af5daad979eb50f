use crate::{
    catalog::Catalog,
    config::Config,
    document::{self, SourceDocument},
    plan::SplitPlan,
    section::{SectionFile, SectionTable},
    splitter::{SplitOptions, Splitter},
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "catalog-split")]
#[command(about = "Split a large catalog PDF into named sections by page range")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./catalog-split.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Section table (TOML or JSON) replacing the one in the config.
    #[arg(long)]
    pub sections: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print page count, size and encryption flag of a PDF.
    Inspect {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Resolve the section table against a PDF without writing anything.
    Plan {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Write one PDF per section plus the manifest.
    Split {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List the section files in an output directory.
    List {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Find a section file by number or name and print its path and URL.
    Resolve {
        query: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = match &cfg_path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
    if let Some(p) = &cfg_path {
        info!("config {}", p.display());
    }

    match &args.cmd {
        Command::Inspect { input } => inspect(&resolve_input(&cfg, input.as_deref())?),
        Command::Plan { input } => {
            let table = load_table(&cfg, args.sections.as_deref())?;
            plan(&table, &resolve_input(&cfg, input.as_deref())?)
        }
        Command::Split { input, out_dir } => {
            let table = load_table(&cfg, args.sections.as_deref())?;
            let input = resolve_input(&cfg, input.as_deref())?;
            split(&cfg, &table, &input, &resolve_out_dir(&cfg, out_dir.as_deref()))
        }
        Command::List { out_dir } => list(&cfg, &resolve_out_dir(&cfg, out_dir.as_deref())),
        Command::Resolve { query, out_dir } => {
            resolve(&cfg, query, &resolve_out_dir(&cfg, out_dir.as_deref()))
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["catalog-split.toml", "catalog-split.example.toml"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(
    args: &Args,
    cfg: &Config,
    file_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for JSON results.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("catalog-split.log"))
}

fn resolve_input(cfg: &Config, user: Option<&Path>) -> Result<PathBuf> {
    let input = match user {
        Some(p) => p.to_path_buf(),
        None if !cfg.paths.input.is_empty() => PathBuf::from(&cfg.paths.input),
        None => return Err(anyhow!("no input: pass --input or set paths.input")),
    };
    validate_input(cfg, &input)?;
    Ok(input)
}

fn resolve_out_dir(cfg: &Config, user: Option<&Path>) -> PathBuf {
    user.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir))
}

fn load_table(cfg: &Config, user: Option<&Path>) -> Result<SectionTable> {
    let file = match user {
        Some(p) => SectionFile::load(p)?,
        None if !cfg.table.sections_file.is_empty() => {
            SectionFile::load(Path::new(&cfg.table.sections_file))?
        }
        None => SectionFile {
            label: cfg.table.label.clone(),
            sections: cfg.table.sections.clone(),
        },
    };
    let label = file.label.clone().or_else(|| cfg.table.label.clone());
    let table = SectionTable::new(label, file.sections)?;
    if table.is_empty() {
        warn!("section table is empty; nothing will be written besides the manifest");
    }
    Ok(table)
}

fn inspect(input: &Path) -> Result<()> {
    let info = document::inspect(input)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn plan(table: &SectionTable, input: &Path) -> Result<()> {
    let info = document::inspect(input)?;
    let plan = SplitPlan::resolve(table.sections(), info.page_count);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn split(cfg: &Config, table: &SectionTable, input: &Path, out_dir: &Path) -> Result<()> {
    let source = SourceDocument::open(input)?;
    let splitter = Splitter::new(SplitOptions::from_config(cfg));
    let manifest = splitter
        .split(&source, table, out_dir)
        .with_context(|| format!("splitting {}", input.display()))?;

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "input": input,
                "out_dir": out_dir,
                "manifest": splitter.manifest_path(out_dir),
                "total_pages": manifest.total_pages,
                "emitted": manifest.sections.len(),
                "skipped": table.len() - manifest.sections.len(),
                "status": "ok"
            }))?
        );
    }

    Ok(())
}

fn list(cfg: &Config, out_dir: &Path) -> Result<()> {
    let catalog = Catalog::scan(cfg, out_dir)?;
    info!(
        "{} files, {:.1}MB total",
        catalog.entries.len(),
        crate::util::bytes_to_mb(catalog.total_bytes())
    );
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

fn resolve(cfg: &Config, query: &str, out_dir: &Path) -> Result<()> {
    let catalog = Catalog::scan(cfg, out_dir)?;
    let entry = catalog
        .resolve(query)
        .ok_or_else(|| anyhow!("no section matches {query:?} in {}", out_dir.display()))?;
    println!("{}", serde_json::to_string_pretty(entry)?);
    Ok(())
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    let bytes = std::fs::metadata(input)
        .with_context(|| format!("stat input: {}", input.display()))?
        .len();
    if bytes > cfg.limits.max_input_file_bytes {
        return Err(anyhow!("input exceeds max_input_file_bytes: {bytes}"));
    }

    if let Some(ext) = input.extension().and_then(|s| s.to_str()) {
        if !ext.eq_ignore_ascii_case("pdf") {
            return Err(anyhow!("input is not a PDF: {}", input.display()));
        }
    } else {
        warn!("input has no extension; assuming PDF: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}
