use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use codequal_core::{
    audit::file_scanner::{DEFAULT_EXTENSIONS, DEFAULT_IGNORED_DIRS},
    llm::ollama::OllamaGateway,
    render_report, Auditor, FileScanner, GatewaySettings, OutputFormat,
};

#[derive(Parser, Debug)]
#[command(
    name = "codequal",
    author,
    version,
    about = "LLM-assisted source code quality auditor"
)]
struct Cli {
    /// Optional configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Audit every eligible source file under a directory
    Audit {
        /// Root of the project to audit
        path: PathBuf,
        /// Write the rendered report to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value = "human")]
        format: Format,
        /// Model service base URL
        #[arg(long)]
        endpoint: Option<String>,
        /// Model used for the per-file analysis
        #[arg(long)]
        model: Option<String>,
        /// Smaller model used for the JSON repair pass
        #[arg(long = "repair-model")]
        repair_model: Option<String>,
        /// Additional file extensions to scan (repeatable)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,
        /// Additional directory names to prune (repeatable)
        #[arg(long = "ignore-dir", value_name = "NAME")]
        ignored_dirs: Vec<String>,
    },
    /// Check that the model service is reachable
    Health {
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Show the default extension allow-list and pruned directories
    Defaults {
        /// Emit as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Human,
    Json,
    Yaml,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
            Format::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Optional settings loaded from `--config`; every field may be omitted.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    endpoint: Option<String>,
    model: Option<String>,
    repair_model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    ignored_dirs: Vec<String>,
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    settings
        .try_deserialize()
        .with_context(|| format!("invalid config file {}", path.display()))
}

/// Layer settings: defaults < config file < environment < CLI flags.
fn resolve_settings(
    file: &FileConfig,
    endpoint: Option<String>,
    model: Option<String>,
    repair_model: Option<String>,
) -> GatewaySettings {
    let mut settings = GatewaySettings::default();
    if let Some(value) = &file.endpoint {
        settings.endpoint = value.clone();
    }
    if let Some(value) = &file.model {
        settings.model = value.clone();
    }
    if let Some(value) = &file.repair_model {
        settings.repair_model = value.clone();
    }
    if let Some(value) = file.timeout_secs {
        settings.timeout_secs = value;
    }
    if let Some(value) = file.max_retries {
        settings.max_retries = value;
    }
    settings.overlay_env();
    if let Some(value) = endpoint {
        settings.endpoint = value;
    }
    if let Some(value) = model {
        settings.model = value;
    }
    if let Some(value) = repair_model {
        settings.repair_model = value;
    }
    settings
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let file_config = load_file_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Audit {
            path,
            output,
            format,
            endpoint,
            model,
            repair_model,
            extensions,
            ignored_dirs,
        } => {
            let settings = resolve_settings(&file_config, endpoint, model, repair_model);
            let scanner = FileScanner::default()
                .with_extra_extensions(file_config.extensions.iter().cloned())
                .with_extra_ignored_dirs(file_config.ignored_dirs.iter().cloned())
                .with_extra_extensions(extensions)
                .with_extra_ignored_dirs(ignored_dirs);
            run_audit(&path, output.as_deref(), format.into(), settings, scanner).await?
        }
        Commands::Health { endpoint } => {
            let settings = resolve_settings(&file_config, endpoint, None, None);
            run_health(settings).await?
        }
        Commands::Defaults { json } => print_defaults(json)?,
    }
    Ok(())
}

async fn run_audit(
    path: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    settings: GatewaySettings,
    scanner: FileScanner,
) -> Result<()> {
    if !path.is_dir() {
        bail!("audit root {} is not a directory", path.display());
    }
    let gateway = OllamaGateway::new(&settings)?;
    let auditor = Auditor::new(gateway, scanner, settings.model, settings.repair_model);
    let report = auditor.audit(path).await;

    let rendered = render_report(&report, format).context("failed to render report")?;
    match output {
        Some(target) => {
            fs::write(target, rendered)
                .with_context(|| format!("failed to write report to {}", target.display()))?;
            println!("Report written to {}", target.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

async fn run_health(settings: GatewaySettings) -> Result<()> {
    let endpoint = settings.endpoint.clone();
    let gateway = OllamaGateway::new(&settings)?;
    print!("Checking model service at {endpoint} ... ");
    if gateway.health_check().await? {
        println!("ok");
        Ok(())
    } else {
        println!("unreachable");
        bail!("model service at {endpoint} is not responding");
    }
}

fn print_defaults(json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "extensions": DEFAULT_EXTENSIONS,
            "ignored_dirs": DEFAULT_IGNORED_DIRS,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!("Extensions scanned by default:");
    for ext in DEFAULT_EXTENSIONS {
        println!("  .{ext}");
    }
    println!("Directories pruned by default:");
    for dir in DEFAULT_IGNORED_DIRS {
        println!("  {dir}");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
