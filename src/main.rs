use chrono::Utc;
use clap::{Parser, Subcommand};
use docsite::compose::Template;
use docsite::site::{self, RenderContext};
use docsite::{config, output, timestamps};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docsite")]
#[command(about = "Static site generator for numbered markdown documentation")]
#[command(long_about = "\
Static site generator for numbered markdown documentation

Every markdown file in the source directory becomes one page. Pages are
ordered by the first number in their file name and linked to their
neighbours.

Source structure:

  docs/
  ├── config.toml       # Site config (optional)
  ├── template.html     # Page template (optional, built-in otherwise)
  ├── public/           # Copied verbatim to the output root
  ├── index.md          # No number: sorts first, served at /
  ├── 1-intro.md
  ├── 2-install.md
  └── 10-faq.md         # Numeric order: after 2-install.md

Metadata (optional, first lines of a document):

  <!--
  title: Getting Started
  author: Jane Doe
  date: 2024-03-01
  -->

Run 'docsite gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Source directory of markdown documents
    #[arg(long, default_value = "docs", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Page template (defaults to <source>/template.html, then the built-in one)
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Log progress (sets the log level to info)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every document and write the site
    Build {
        /// Path prefix for root-relative links, e.g. /blog/ (overrides config.toml)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Scan and render without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build { base_url } => {
            let mut site_config = config::load_config(&cli.source)?;
            if let Some(base_url) = base_url {
                site_config.base_url = base_url;
                site_config.validate()?;
            }
            init_thread_pool(&site_config.processing);
            let template = load_template(cli.template.as_deref(), &cli.source)?;
            let timestamps = timestamps::source_for(site_config.timestamps);
            let ctx = RenderContext {
                config: &site_config,
                template: &template,
                timestamps: timestamps.as_ref(),
                build_time: Utc::now(),
            };

            println!(
                "==> Building {} → {}",
                cli.source.display(),
                cli.output.display()
            );
            let report = site::build(&cli.source, &cli.output, &ctx)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);
            let template = load_template(cli.template.as_deref(), &cli.source)?;
            let timestamps = timestamps::source_for(site_config.timestamps);
            let ctx = RenderContext {
                config: &site_config,
                template: &template,
                timestamps: timestamps.as_ref(),
                build_time: Utc::now(),
            };

            println!("==> Checking {}", cli.source.display());
            let report = site::check(&cli.source, &ctx)?;
            output::print_scan_output(&report.documents, &cli.source);
            println!();
            output::print_check_output(&report.pages);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `--verbose` forces info, otherwise `RUST_LOG`, otherwise warnings only.
///
/// Logs go to stderr so stage output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores; config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn load_template(explicit: Option<&Path>, source: &Path) -> Result<Template, Box<dyn std::error::Error>> {
    let template = Template::locate(explicit, source).map_err(|e| {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.join("template.html"));
        format!("Failed to read template {}: {e}", path.display())
    })?;
    tracing::info!(origin = ?template.origin(), "Using template");
    Ok(template)
}
