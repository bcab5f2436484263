//! wmf-yir - Year in Review report tool
//!
//! Populates, inspects, and clears Year in Review reports in the local
//! database, and manages the cached feature config and local switch.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wmf_common::config::{LoggingConfig, RootFolderInitializer, RootFolderResolver, TomlConfig};
use wmf_common::{Project, SettingsStore};
use wmf_yir::db::{PageViewStore, ReportStore};
use wmf_yir::remote_config::DeveloperSettings;
use wmf_yir::services::MediaWikiClient;
use wmf_yir::{Dependencies, PopulationOutcome, Report, YearInReviewDataController};

const MODULE_NAME: &str = "wmf-yir";

#[derive(Parser, Debug)]
#[command(author, version, about = "Year in Review report tool")]
struct Args {
    /// Root folder holding wmf.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/wmf/wmf-yir.toml)
    #[arg(short, long, env = "WMF_YIR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Populate the report for a year
    Populate {
        #[arg(long)]
        year: i32,
        /// ISO 3166 country code of the device region
        #[arg(long)]
        country: String,
        /// Primary app language (Wikipedia language code)
        #[arg(long)]
        language: String,
        /// Logged-in username; the editing slide needs one
        #[arg(long)]
        username: Option<String>,
    },
    /// Print one report
    Show {
        #[arg(long)]
        year: i32,
    },
    /// Print every report
    List,
    /// Delete one report and its slides
    Delete {
        #[arg(long)]
        year: i32,
    },
    /// Delete every report
    DeleteAll,
    /// Cache a remote feature config JSON document
    ImportConfig { path: PathBuf },
    /// Drop the cached remote feature config
    ClearConfig,
    /// Turn the local Year in Review switch on or off
    Enable {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Record a local page view
    RecordView {
        #[arg(long)]
        language: String,
        #[arg(long)]
        title: String,
        /// RFC 3339 timestamp (default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Print whether the Year in Review entry point would show
    EntryPoint {
        #[arg(long)]
        country: String,
        #[arg(long)]
        language: String,
    },
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

fn print_report(report: &Report) {
    println!("Year {}", report.year);
    for slide in &report.slides {
        let count = match slide.count() {
            Ok(Some(count)) => count.to_string(),
            Ok(None) => "-".to_string(),
            Err(_) => "?".to_string(),
        };
        println!(
            "  {:<10} evaluated={:<5} display={:<5} count={}",
            slide.id.as_str(),
            slide.evaluated,
            slide.display,
            count
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(MODULE_NAME, args.config.as_deref());
    init_tracing(&toml_config.logging)?;

    info!("Starting wmf-yir v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(&toml_config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = wmf_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let settings_store = SettingsStore::new(pool.clone());
    let page_views = Arc::new(PageViewStore::new(pool.clone()));

    match &args.command {
        Command::ImportConfig { path } => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = DeveloperSettings::cache_feature_config(&settings_store, &json).await?;
            println!("Cached feature config ({} iOS entries)", config.ios.len());
            return Ok(());
        }
        Command::ClearConfig => {
            DeveloperSettings::clear_feature_config(&settings_store).await?;
            println!("Cleared cached feature config");
            return Ok(());
        }
        Command::Enable { enabled } => {
            DeveloperSettings::set_enable_year_in_review(&settings_store, *enabled).await?;
            println!("Year in Review enabled: {}", enabled);
            return Ok(());
        }
        Command::RecordView { language, title, at } => {
            let project = Project::wikipedia(language.as_str());
            page_views
                .record_page_view(&project, title, (*at).unwrap_or_else(wmf_common::time::now))
                .await?;
            return Ok(());
        }
        _ => {}
    }

    let developer_settings = DeveloperSettings::load(&settings_store).await?;
    let client = MediaWikiClient::new(&toml_config.mediawiki)?;

    let mut deps = Dependencies::new(
        Some(ReportStore::new(pool.clone())),
        settings_store,
        developer_settings,
        page_views,
    )
    .with_contributions(Arc::new(client));
    deps.target_config_year_id = toml_config.year_in_review.target_config_year_id.clone();
    deps.report_year = toml_config.year_in_review.report_year;

    let controller = YearInReviewDataController::new(deps)?;

    match args.command {
        Command::Populate {
            year,
            country,
            language,
            username,
        } => {
            let project = Project::wikipedia(language);
            let outcome = controller
                .populate_report_data(year, &country, Some(&project), username.as_deref())
                .await?;

            match outcome {
                PopulationOutcome::Skipped(reason) => println!("Skipped: {}", reason),
                PopulationOutcome::Populated(report) => print_report(&report),
            }
        }
        Command::Show { year } => match controller.fetch_report(year).await? {
            Some(report) => print_report(&report),
            None => println!("No report for {}", year),
        },
        Command::List => {
            for report in controller.fetch_all_reports().await? {
                print_report(&report);
            }
        }
        Command::Delete { year } => {
            controller.delete_report(year).await?;
            println!("Deleted report for {}", year);
        }
        Command::DeleteAll => {
            controller.delete_all_reports().await?;
            println!("Deleted all reports");
        }
        Command::EntryPoint { country, language } => {
            let project = Project::wikipedia(language);
            let show = controller
                .should_show_entry_point(Some(&country), Some(&project))
                .await?;
            println!("{}", show);
        }
        Command::ImportConfig { .. }
        | Command::ClearConfig
        | Command::Enable { .. }
        | Command::RecordView { .. } => {}
    }

    Ok(())
}
