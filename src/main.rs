use std::env;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use quartz_sync::config::{DEFAULT_CONFIG_FILE, LookupConfig, SyncConfig};
use quartz_sync::io::csv_read::{read_books, read_travel};
use quartz_sync::io::notion::NotionExport;
use quartz_sync::io::DirectoryStore;
use quartz_sync::lookup::http::HttpClient;
use quartz_sync::lookup::{CoverSource, Geocoder, NoLookup, Nominatim, OpenLibrary, PlaceResolver};
use quartz_sync::sync::{
    BookLayout, RunOptions, SyncReport, TravelSources, refresh_travel, sync_books, sync_travel,
};
use quartz_sync::{Result, SyncError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = SyncConfig::load(&config_path)?;
    let options = RunOptions {
        dry_run: cli.dry_run,
    };
    // Dry runs never touch the network either.
    let remote = !(cli.offline || cli.dry_run);

    let report = match cli.command {
        Command::Books => execute_books(&config, remote, options)?,
        Command::Travel => execute_travel(&config, remote, options)?,
        Command::RefreshTravel => execute_refresh(&config, remote, options)?,
    };
    print_report(&report, cli.json)
}

fn execute_books(config: &SyncConfig, remote: bool, options: RunOptions) -> Result<SyncReport> {
    let books = config.books()?;
    if !books.csv.exists() {
        return Err(SyncError::MissingInput(books.csv.clone()));
    }
    let records = read_books(&books.csv)?;
    let mut store = DirectoryStore::open(&books.content_dir)?;
    let covers = cover_source(&config.lookup, remote);
    sync_books(records, &mut store, covers.as_ref(), &BookLayout::from(books), options)
}

fn execute_travel(config: &SyncConfig, remote: bool, options: RunOptions) -> Result<SyncReport> {
    let travel = config.travel()?;
    if !travel.csv.exists() {
        return Err(SyncError::MissingInput(travel.csv.clone()));
    }
    let records = read_travel(&travel.csv)?;
    let mut store = DirectoryStore::open(&travel.content_dir)?;

    let overrides = config.coordinate_overrides();
    let geocoder = geocoder(&config.lookup, remote);
    let places = PlaceResolver::new(&overrides, geocoder.as_ref(), &config.lookup.geocode_qualifiers);
    let export = NotionExport::new(&travel.notion_dir);
    let sources = TravelSources {
        export: &export,
        assets_dir: &travel.assets_dir,
        places: &places,
    };
    sync_travel(records, &mut store, &sources, options)
}

fn execute_refresh(config: &SyncConfig, remote: bool, options: RunOptions) -> Result<SyncReport> {
    let travel = config.travel()?;
    let mut store = DirectoryStore::open(&travel.content_dir)?;
    let overrides = config.coordinate_overrides();
    let geocoder = geocoder(&config.lookup, remote);
    let places = PlaceResolver::new(&overrides, geocoder.as_ref(), &config.lookup.geocode_qualifiers);
    refresh_travel(&mut store, &places, options)
}

fn cover_source(lookup: &LookupConfig, remote: bool) -> Box<dyn CoverSource> {
    if !remote {
        return Box::new(NoLookup);
    }
    let client = HttpClient::new(&lookup.user_agent, lookup.cover_timeout(), lookup.cover_pause());
    Box::new(OpenLibrary::new(
        client,
        &lookup.open_library_search_url,
        &lookup.open_library_covers_url,
    ))
}

fn geocoder(lookup: &LookupConfig, remote: bool) -> Box<dyn Geocoder> {
    if !remote {
        return Box::new(NoLookup);
    }
    let client = HttpClient::new(&lookup.user_agent, lookup.geocode_timeout(), lookup.geocode_pause());
    Box::new(Nominatim::new(client, &lookup.nominatim_url))
}

fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for file in &report.created {
        println!("created  {file}");
    }
    for page in &report.patched {
        println!("patched  {} ({})", page.file, page.fields.join(", "));
    }
    for skipped in &report.skipped {
        println!("skipped  {} ({:?})", skipped.title, skipped.reason);
    }
    for name in &report.lookup_misses {
        println!("missing  {name}");
    }
    println!("{report}");
    Ok(())
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_env("QUARTZ_SYNC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "quartz_sync=info,warn",
            1 => "quartz_sync=debug,info",
            _ => "trace",
        })
    });
    let ansi = env::var_os("NO_COLOR").is_none();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr).with_ansi(ansi))
        .try_init()
        .map_err(|error| SyncError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Sync Notion database exports into a Quartz content folder."
)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report what would change without writing anything.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Skip cover and geocoder lookups.
    #[arg(long, global = true)]
    offline: bool,

    /// Print the run report as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log detail (-v, -vv).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create and patch book pages from the books export.
    Books,
    /// Create and patch travel pages from the travel log export.
    Travel,
    /// Clean up existing travel pages: fix dates, fill coordinates and titles.
    RefreshTravel,
}
