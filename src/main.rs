use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use nearaid::aggregate::{AggregateOptions, AggregationStatus, Aggregator, CancelToken};
use nearaid::api::{NominatimClient, OverpassClient};
use nearaid::config::{FileConfig, NominatimConfig, OverpassConfig};
use nearaid::domain::{Coordinate, DEFAULT_SELECTION};
use nearaid::export::{render_table, write_csv_file};
use nearaid::resolve::{MissingOperatorDefault, NamePolicy};
use nearaid::search::{SearchReport, SearchRequest, search};

/// Find emergency and civic resources near a place using OpenStreetMap data
///
/// Examples:
///   # Hospitals, medical camps and police stations within 5 km of Hyderabad
///   nearaid -p "Hyderabad"
///
///   # Pharmacies and fire stations within 2 km, at most 20 of each
///   nearaid -p "Koti, Hyderabad" -r 2 -c Pharmacy -c "Fire Station" --max-per-category 20
///
///   # Skip geocoding and export everything to CSV
///   nearaid --lat 17.385 --lon 78.4867 --csv resources.csv --contact
#[derive(Parser, Debug)]
#[command(name = "nearaid")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches nearaid.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Place name to search around (optional if --lat and --lon are provided)
    #[arg(short = 'p', long)]
    place: Option<String>,

    /// Latitude for direct coordinate input (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude for direct coordinate input (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Search radius in kilometers [default: 5]
    #[arg(short = 'r', long)]
    radius: Option<f64>,

    /// Resource category to include (repeatable; see --list-categories)
    #[arg(short = 'c', long = "category")]
    categories: Vec<String>,

    /// Keep at most this many results per category, in source order (0 = no cap)
    #[arg(long)]
    max_per_category: Option<usize>,

    /// What to do with unnamed places
    #[arg(long, value_enum)]
    name_policy: Option<NamePolicy>,

    /// Category for hospitals without a recognizable operator
    #[arg(long, value_enum)]
    missing_operator: Option<MissingOperatorDefault>,

    /// Do not reverse geocode places that lack address tags
    #[arg(long)]
    no_reverse_geocode: bool,

    /// Maximum reverse geocode lookups per search (about one per second)
    #[arg(long)]
    reverse_budget: Option<usize>,

    /// Category queries to run in parallel (1-4)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    workers: Option<u8>,

    /// Write results to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Include phone and opening hours columns
    #[arg(long)]
    contact: bool,

    /// Print the full report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// List known categories and exit
    #[arg(long)]
    list_categories: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    init_tracing(args.verbose);

    let file_config = if let Some(ref config_path) = args.config {
        if !config_path.exists() {
            bail!("Config file not found: {:?}", config_path);
        }
        Some(FileConfig::from_path(config_path)?)
    } else {
        FileConfig::load()
    };

    let catalog = file_config
        .as_ref()
        .map(FileConfig::catalog)
        .unwrap_or_default();

    if args.list_categories {
        for spec in catalog.iter() {
            println!("{:<16} {}", spec.name, spec.filter);
        }
        return Ok(());
    }

    let mut options = file_config
        .as_ref()
        .map(FileConfig::aggregate_options)
        .unwrap_or_default();
    apply_overrides(&mut options, &args);

    let place = args
        .place
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.place.clone()));
    let radius_km = args
        .radius
        .or_else(|| file_config.as_ref().map(|c| c.radius_km))
        .unwrap_or(5.0);
    let max_per_category = args
        .max_per_category
        .or_else(|| file_config.as_ref().map(|c| c.max_per_category))
        .unwrap_or(0);
    let categories = selected_categories(&args, file_config.as_ref());
    let csv_path = args
        .csv
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()));

    if place.is_none() && args.lat.is_none() {
        bail!("Must provide either --place/-p or --lat and --lon");
    }

    let overpass_config = file_config
        .as_ref()
        .and_then(|c| c.overpass.clone())
        .unwrap_or_else(OverpassConfig::default);
    let nominatim_config = file_config
        .as_ref()
        .and_then(|c| c.nominatim.clone())
        .unwrap_or_else(NominatimConfig::default);

    if args.verbose {
        eprintln!("Configuration:");
        if let Some(ref p) = place {
            eprintln!("  Place: {}", p);
        }
        eprintln!("  Radius: {} km", radius_km);
        eprintln!("  Categories: {}", categories.join(", "));
        eprintln!("  Max per category: {}", max_per_category);
        eprintln!("  Name policy: {:?}", options.name_policy);
        eprintln!("  Missing operator: {:?}", options.missing_operator);
        eprintln!("  Reverse geocode: {}", options.reverse_geocode);
        eprintln!("  Workers: {}", options.workers);
        eprintln!("  Overpass mirrors: {}", overpass_config.urls.len());
        eprintln!();
    }

    let overpass = OverpassClient::new(overpass_config).context("Failed to create Overpass client")?;
    let nominatim =
        NominatimClient::new(&nominatim_config).context("Failed to create Nominatim client")?;
    let aggregator = Aggregator::new(&catalog, &overpass, options).with_geocoder(&nominatim);
    let cancel = CancelToken::new();

    let spinner = create_spinner("Searching OpenStreetMap...");
    let start = Instant::now();

    let report = if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let center = Coordinate::new(lat, lon);
        let aggregation = aggregator
            .aggregate_with_cancel(
                center,
                radius_km,
                categories.as_slice(),
                max_per_category,
                &cancel,
            )
            .context("Search failed")?;
        SearchReport::new(format!("{:.4}, {:.4}", lat, lon), center, radius_km, aggregation)
    } else {
        let request = SearchRequest {
            place: place.clone().unwrap_or_default(),
            radius_km,
            categories: categories.clone(),
            max_per_category,
        };
        search(&nominatim, &aggregator, &request, &cancel).context("Search failed")?
    };

    spinner.finish_with_message(format!(
        "Found {} resources near {} [{:.1}s]",
        report.resources.len(),
        report.place,
        start.elapsed().as_secs_f32()
    ));

    for warning in &report.warnings {
        eprintln!("Warning ({}): {}", warning.category, warning.message);
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_report(&report, args.contact);
    }

    if let Some(ref path) = csv_path {
        write_csv_file(path, &report.resources, args.contact)?;
        eprintln!("Wrote {} rows to {}", report.resources.len(), path.display());
    }

    if args.verbose {
        eprintln!("Done! Total time: {:.1}s", total_start.elapsed().as_secs_f32());
    }

    if report.status == AggregationStatus::AllCategoriesFailed {
        bail!("Every category query failed; check your connection or try again later");
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "nearaid=debug" } else { "nearaid=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(options: &mut AggregateOptions, args: &Args) {
    if let Some(policy) = args.name_policy {
        options.name_policy = policy;
    }
    if let Some(missing) = args.missing_operator {
        options.missing_operator = missing;
    }
    if args.no_reverse_geocode {
        options.reverse_geocode = false;
    }
    if args.reverse_budget.is_some() {
        options.reverse_geocode_budget = args.reverse_budget;
    }
    if let Some(workers) = args.workers {
        options.workers = workers as usize;
    }
}

fn selected_categories(args: &Args, file_config: Option<&FileConfig>) -> Vec<String> {
    if !args.categories.is_empty() {
        return args.categories.clone();
    }
    match file_config {
        Some(c) if !c.categories.is_empty() => c.categories.clone(),
        _ => DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect(),
    }
}

fn print_report(report: &SearchReport, include_contact: bool) {
    println!();
    println!(
        "Search center: {} ({:.4}, {:.4}), radius {} km",
        report.place, report.center.lat, report.center.lon, report.radius_km
    );
    println!();

    match report.status {
        AggregationStatus::Found => print!("{}", render_table(&report.resources, include_contact)),
        AggregationStatus::NoResources => {
            println!("No resources found within {} km.", report.radius_km)
        }
        AggregationStatus::AllCategoriesFailed => {
            println!("No results: every category query failed.")
        }
        AggregationStatus::NoKnownCategories => {
            println!("No results: none of the selected categories exist (see --list-categories).")
        }
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
