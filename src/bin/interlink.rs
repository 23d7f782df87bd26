//! Interlink CLI — inject internal links into rendered content.
//!
//! Usage:
//!   interlink link --input post.html --catalog pages.json [--base-url URL] [--output out.html] [--report report.json]
//!   interlink validate --catalog pages.yaml [--config config.yaml]

use clap::{Parser, Subcommand};
use interlink::{Catalog, EngineConfig, LinkEngine};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "interlink",
    version,
    about = "Internal link injection engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log per-block decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Link one document and write the result
    Link {
        /// HTML (or Markdown with --markdown) document to link
        #[arg(long)]
        input: PathBuf,
        /// JSON or YAML list of target pages
        #[arg(long)]
        catalog: PathBuf,
        /// Prefix for page URLs built from slugs
        #[arg(long, default_value = "")]
        base_url: String,
        /// Engine configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Treat the input as CommonMark
        #[arg(long)]
        markdown: bool,
        /// Where to write the linked document (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Where to write the JSON link report
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Check a catalog and configuration without linking anything
    Validate {
        /// JSON or YAML list of target pages
        #[arg(long)]
        catalog: PathBuf,
        /// Engine configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Default configuration path (~/.config/interlink/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("interlink").join("config.yaml");
    path.exists().then_some(path)
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, String> {
    match path.or_else(default_config_path) {
        Some(path) => EngineConfig::from_path(&path).map_err(|e| e.to_string()),
        None => Ok(EngineConfig::default()),
    }
}

fn load_catalog(path: &Path) -> Result<Catalog, String> {
    Catalog::from_path(path).map_err(|e| e.to_string())
}

fn write_or_print(path: Option<&Path>, content: &str) -> Result<(), String> {
    match path {
        Some(path) => std::fs::write(path, content)
            .map_err(|e| format!("cannot write '{}': {}", path.display(), e)),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn cmd_link(
    input: &Path,
    catalog: &Path,
    base_url: String,
    config: Option<PathBuf>,
    markdown: bool,
    output: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), String> {
    let config = load_config(config)?;
    let catalog = load_catalog(catalog)?;
    let engine = LinkEngine::with_catalog(catalog, base_url, config).map_err(|e| e.to_string())?;

    let source = std::fs::read_to_string(input)
        .map_err(|e| format!("cannot read '{}': {}", input.display(), e))?;
    let result = if markdown {
        engine.link_markdown(&source)
    } else {
        engine.link_html(&source)
    };

    write_or_print(output, &result.html)?;
    if let Some(path) = report {
        let json = result
            .report
            .to_json()
            .map_err(|e| format!("cannot serialize report: {}", e))?;
        write_or_print(Some(path), &json)?;
    }

    eprintln!(
        "Injected {} link(s) across {} scanned block(s)",
        result.report.stats.links_injected, result.report.stats.blocks_scanned
    );
    Ok(())
}

fn cmd_validate(catalog: &Path, config: Option<PathBuf>) -> Result<(), String> {
    let config = load_config(config)?;
    let catalog = load_catalog(catalog)?;
    let pages = catalog.len();
    LinkEngine::with_catalog(catalog, "", config).map_err(|e| e.to_string())?;
    println!("Catalog OK: {} page(s)", pages);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("interlink=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Link {
            input,
            catalog,
            base_url,
            config,
            markdown,
            output,
            report,
        } => cmd_link(
            &input,
            &catalog,
            base_url,
            config,
            markdown,
            output.as_deref(),
            report.as_deref(),
        ),
        Commands::Validate { catalog, config } => cmd_validate(&catalog, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
