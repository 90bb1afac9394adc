//! # Document Harvester CLI (`docharvest`)
//!
//! Signs in to Microsoft 365, walks every document library of a SharePoint
//! site and mirrors the files locally, optionally pushing each one into an
//! Amazon Bedrock knowledge base.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docharvest test` | Sign in and check the site, its drives and the current user |
//! | `docharvest scan` | Enumerate documents and save a metadata snapshot |
//! | `docharvest download` | Download documents (from a fresh scan or a snapshot) |
//! | `docharvest config` | Report which configuration sections are usable |
//!
//! ## Examples
//!
//! ```bash
//! # Check settings from .env
//! docharvest config
//!
//! # Scan a site given on the command line
//! docharvest --site-url https://contoso.sharepoint.com/sites/Finance scan
//!
//! # Reuse the snapshot and ingest into Bedrock without prompting
//! docharvest download --metadata-file sharepoint_documents.json --bedrock --yes
//! ```

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docharvest::{
    format_file_size, load_dotenv, validate_environment, DocumentDescriptor, HarvestConfig,
    Harvester, HarvesterDependencies, LogContext, LogLevel, LoggingConfig, ProgressFn,
    DEFAULT_SNAPSHOT_FILE,
};
use tracing::info;

/// SharePoint document harvester.
///
/// Settings come from the environment (optionally loaded from a `.env`
/// file); the global flags below override the SharePoint ones.
#[derive(Parser)]
#[command(name = "docharvest", version, about = "Harvest documents from SharePoint")]
struct Cli {
    /// SharePoint site URL, e.g. `https://contoso.sharepoint.com/sites/Finance`
    #[arg(long, global = true)]
    site_url: Option<String>,

    /// Azure application (client) id
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Azure tenant id; derived from the site URL when omitted
    #[arg(long, global = true)]
    tenant_id: Option<String>,

    /// DEBUG, INFO, WARNING or ERROR
    #[arg(long, global = true, default_value = "INFO")]
    log_level: String,

    /// Also write log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// `.env` file to load instead of searching the working directory
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and test the connection to the site.
    Test,

    /// Scan the site and save document metadata.
    Scan {
        /// Snapshot file to write
        #[arg(long, short, default_value = DEFAULT_SNAPSHOT_FILE)]
        output: PathBuf,
    },

    /// Download documents, optionally ingesting them into Bedrock.
    Download {
        /// Root directory for downloaded files
        #[arg(long, short, default_value = "downloads")]
        output_dir: PathBuf,

        /// Use this snapshot instead of scanning the site
        #[arg(long)]
        metadata_file: Option<PathBuf>,

        /// Ingest every downloaded file into the configured knowledge base
        #[arg(long)]
        bedrock: bool,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Show the configuration status.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    load_dotenv(cli.config_file.as_deref())?;
    setup_logging(&cli)?;

    let runtime = core_async::runtime::build().context("Failed to start async runtime")?;
    runtime.block_on(run(cli))
}

fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let level: LogLevel = cli.log_level.parse()?;
    let mut config = LoggingConfig::default().with_level(level);
    if let Some(path) = &cli.log_file {
        config = config.with_log_file(path);
    }
    docharvest::init_logging(config)?;
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Config => {
            cmd_config();
            Ok(())
        }
        Commands::Test => {
            let mut harvester = harvester(&cli)?;
            cmd_test(&mut harvester).await
        }
        Commands::Scan { output } => {
            let mut harvester = harvester(&cli)?;
            cmd_scan(&mut harvester, output).await
        }
        Commands::Download {
            output_dir,
            metadata_file,
            bedrock,
            yes,
        } => {
            let mut harvester = harvester(&cli)?;
            if *bedrock {
                harvester
                    .config()
                    .require_ingestion()
                    .context("--bedrock needs BEDROCK_KNOWLEDGE_BASE_ID and BEDROCK_DATA_SOURCE_ID")?;
            }
            cmd_download(
                &mut harvester,
                output_dir,
                metadata_file.as_deref(),
                *bedrock,
                *yes,
            )
            .await
        }
    }
}

fn harvester(cli: &Cli) -> anyhow::Result<Harvester> {
    let config = HarvestConfig::from_env()
        .override_with(cli.site_url.clone(), |b, v| b.site_url(v))
        .override_with(cli.client_id.clone(), |b, v| b.client_id(v))
        .override_with(cli.tenant_id.clone(), |b, v| b.tenant_id(v))
        .build()?;

    let deps = HarvesterDependencies::desktop()?;
    Ok(Harvester::new(config, deps, LogContext::for_run()))
}

async fn cmd_test(harvester: &mut Harvester) -> anyhow::Result<()> {
    println!("Testing SharePoint connection...");
    println!("Site URL: {}", harvester.config().sharepoint.site_url);

    println!("\nAuthenticating...");
    harvester.authenticate().await?;
    println!("Authentication successful");

    let report = harvester.test_connection().await?;
    let site = &report.site;
    println!("\nSite Information:");
    println!("  Name: {}", site.display_name.as_deref().unwrap_or("Unknown"));
    println!("  Description: {}", site.description.as_deref().unwrap_or("N/A"));
    println!("  Web URL: {}", site.web_url.as_deref().unwrap_or("N/A"));
    println!("  Document libraries: {}", report.drive_count);

    if let Some(user) = &report.user {
        println!("\nSigned in as:");
        println!("  Name: {}", user.display_name.as_deref().unwrap_or("Unknown"));
        println!("  Email: {}", user.email().unwrap_or("N/A"));
    }
    Ok(())
}

async fn cmd_scan(harvester: &mut Harvester, output: &Path) -> anyhow::Result<()> {
    println!("Scanning SharePoint documents...");
    println!("Site URL: {}", harvester.config().sharepoint.site_url);

    let documents = harvester.scan().await?;
    if documents.is_empty() {
        println!("No documents found");
        return Ok(());
    }

    print_summary(&documents);
    harvester.save_metadata(&documents, output).await?;
    println!("\nMetadata saved to {}", output.display());
    Ok(())
}

async fn cmd_download(
    harvester: &mut Harvester,
    output_dir: &Path,
    metadata_file: Option<&Path>,
    ingest: bool,
    skip_confirmation: bool,
) -> anyhow::Result<()> {
    let documents = match metadata_file {
        Some(path) => {
            println!("Loading documents from metadata file: {}", path.display());
            harvester.load_metadata(path).await?
        }
        None => {
            println!("Scanning SharePoint documents...");
            harvester.scan().await?
        }
    };

    if documents.is_empty() {
        println!("No documents found");
        return Ok(());
    }

    print_summary(&documents);

    if !skip_confirmation && !confirm(&format!("\nDownload {} documents? (y/N): ", documents.len()))? {
        println!("Download cancelled");
        return Ok(());
    }

    println!("\nDownloading to: {}", output_dir.display());
    let progress: &ProgressFn = &|current, total| {
        let percentage = current as f64 / total as f64 * 100.0;
        print!("\rProgress: {}/{} ({:.1}%)", current, total, percentage);
        if current == total {
            println!();
        }
        let _ = io::stdout().flush();
    };

    let total = documents.len();
    if ingest {
        println!("Will also ingest into the Bedrock knowledge base");
        let report = harvester
            .download_all_and_ingest(&documents, output_dir, Some(progress))
            .await?;
        println!(
            "\nDownloaded and ingested {}/{} documents ({} failed)",
            report.succeeded,
            total,
            report.failed()
        );
    } else {
        let report = harvester
            .download_all(&documents, output_dir, Some(progress))
            .await?;
        println!(
            "\nDownloaded {}/{} documents ({} failed)",
            report.succeeded,
            total,
            report.failed()
        );
    }
    info!(total, "Download command finished");
    Ok(())
}

fn cmd_config() {
    let report = validate_environment(|key| std::env::var(key).ok());

    println!("Configuration Status:");
    println!("{}", "=".repeat(50));
    for section in report.sections() {
        let status = if section.configured { "Valid" } else { "Invalid" };
        println!("{}: {}", section.name, status);
        for (key, value) in &section.details {
            println!("  {} = {}", key, value);
        }
        for problem in &section.problems {
            println!("  - {}", problem);
        }
    }

    if !report.is_usable() {
        println!("\nSharePoint settings are incomplete; only `config` will work.");
    }
}

fn print_summary(documents: &[DocumentDescriptor]) {
    let summary = Harvester::summarize(documents);

    println!("\nDocument Summary:");
    println!("  Total documents: {}", summary.total);
    println!("  Total size: {}", format_file_size(summary.total_size));

    println!("\nBy library:");
    for (library, stats) in &summary.libraries {
        println!(
            "  {}: {} documents ({})",
            library,
            stats.count,
            format_file_size(stats.size_bytes)
        );
    }

    println!("\nTop file types:");
    for (extension, count) in summary.top_file_types(10) {
        println!("  .{}: {}", extension, count);
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        bail!("No answer on standard input; pass --yes to skip the prompt");
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
