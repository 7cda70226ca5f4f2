//! listings-explorer CLI - search and analyse short-let listings
//!
//! Usage:
//!   listings-explorer listings --neighbourhood Camden --room-type "Private room" --sort price-asc
//!   listings-explorer listings --landmark "Big Ben" --radius 0.5 --unit km --map
//!   listings-explorer composition
//!   listings-explorer pivot
//!   listings-explorer breakdown Hackney
//!   listings-explorer histogram Hackney "Entire home/apt"

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use listings_explorer::aggregator::{
    composition, neighbourhood_counts, price_histogram, price_table, room_type_breakdown, Summary,
};
use listings_explorer::config::Settings;
use listings_explorer::geo::DistanceUnit;
use listings_explorer::landmark::LANDMARKS;
use listings_explorer::listing::ROOM_TYPES;
use listings_explorer::map::{markers, write_geojson};
use listings_explorer::price::{PriceRange, PRICE_BUCKETS};
use listings_explorer::query::{compute, FilteredView, SortOrder};
use listings_explorer::{load, AreaSelection, Dataset, FilterCriteria};

#[derive(Parser)]
#[command(name = "listings-explorer")]
#[command(about = "Search and analyse short-let listings")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./listings.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listings file, overriding the config
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter and sort listings, then show metrics and the table
    Listings(ListingsArgs),

    /// Room-type composition of every neighbourhood
    Composition,

    /// Price count/mean/min/max per neighbourhood and room type
    Pivot,

    /// Room-type shares within one neighbourhood
    Breakdown {
        neighbourhood: String,
    },

    /// Price distribution of one room type in one neighbourhood
    Histogram {
        neighbourhood: String,
        room_type: String,
    },

    /// List the landmarks available for proximity search
    Landmarks,

    /// List neighbourhoods in the dataset
    Neighbourhoods,

    /// List room types in the dataset
    RoomTypes,
}

#[derive(clap::Args)]
struct ListingsArgs {
    /// Neighbourhood to include (repeatable)
    #[arg(short, long = "neighbourhood", conflicts_with = "landmark")]
    neighbourhoods: Vec<String>,

    /// Search around a landmark instead of by neighbourhood
    #[arg(short, long)]
    landmark: Option<String>,

    /// Distance to the landmark
    #[arg(short, long, default_value_t = 0.5, requires = "landmark")]
    radius: f64,

    /// Unit of the radius: mi or km
    #[arg(short, long, default_value = "mi", value_parser = DistanceUnit::from_str)]
    unit: DistanceUnit,

    /// Room type to include (repeatable)
    #[arg(short = 't', long = "room-type")]
    room_types: Vec<String>,

    /// Lower price bucket
    #[arg(long, default_value = "<50", value_parser = price_labels())]
    price_min: String,

    /// Upper price bucket
    #[arg(long, default_value = "5000+", value_parser = price_labels())]
    price_max: String,

    /// Only listings with at least one review
    #[arg(long)]
    with_reviews: bool,

    /// Only listings available more than 70% of the year
    #[arg(long)]
    high_availability: bool,

    /// id, price-asc or price-desc
    #[arg(short, long, default_value = "id", value_parser = SortOrder::from_str)]
    sort: SortOrder,

    /// Write a GeoJSON map of the results (to the configured path if none given)
    #[arg(long, num_args = 0..=1)]
    map: Option<Option<PathBuf>>,
}

/// The slider labels, cheapest first
fn price_labels() -> PossibleValuesParser {
    PossibleValuesParser::new(PRICE_BUCKETS.map(|b| b.label))
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<()> {
    if let Commands::Landmarks = cli.command {
        for landmark in &LANDMARKS {
            println!(
                "{:<24} {:>11.7} {:>11.7}",
                landmark.name, landmark.coordinate.latitude, landmark.coordinate.longitude
            );
        }
        return Ok(());
    }

    let path = cli.data.as_ref().unwrap_or(&settings.dataset.path);
    let dataset = load(path).with_context(|| format!("cannot load {}", path.display()))?;

    match &cli.command {
        Commands::Listings(args) => run_listings(&dataset, args, settings, cli.format),
        Commands::Composition => {
            let rows = composition(&dataset)?;
            let counts = neighbourhood_counts(&dataset)?;
            if let OutputFormat::Json = cli.format {
                return print_json(&serde_json::json!({ "composition": rows, "counts": counts }));
            }
            println!("Number of Listings in Each Neighbourhood\n");
            println!(
                "{:<26} {:>16} {:>11} {:>13} {:>12} {:>7}",
                "Neighbourhood", ROOM_TYPES[0], ROOM_TYPES[1], ROOM_TYPES[2], ROOM_TYPES[3], "Total"
            );
            for row in &rows {
                println!(
                    "{:<26} {:>16} {:>11} {:>13} {:>12} {:>7}",
                    row.neighbourhood,
                    row.counts[0],
                    row.counts[1],
                    row.counts[2],
                    row.counts[3],
                    row.total
                );
            }
            println!();
            println!("{:<26} {:>18}", "Neighbourhood", "Number of Listings");
            for count in &counts {
                println!("{:<26} {:>18}", count.neighbourhood, count.listings);
            }
            Ok(())
        }
        Commands::Pivot => {
            let rows = price_table(&dataset)?;
            if let OutputFormat::Json = cli.format {
                return print_json(&rows);
            }
            println!(
                "{:<26} {:<16} {:>8} {:>10} {:>9} {:>9}",
                "Neighbourhood", "Room Type", "Listings", "Mean", "Min", "Max"
            );
            for row in &rows {
                println!(
                    "{:<26} {:<16} {:>8} {:>10.2} {:>9.0} {:>9.0}",
                    row.neighbourhood, row.room_type, row.count, row.mean, row.min, row.max
                );
            }
            Ok(())
        }
        Commands::Breakdown { neighbourhood } => {
            require_known(dataset.neighbourhoods(), neighbourhood, "neighbourhood")?;
            let breakdown = room_type_breakdown(&dataset, neighbourhood)?;
            if let OutputFormat::Json = cli.format {
                return print_json(&breakdown);
            }
            println!("Room Type Composition of {}\n", neighbourhood);
            for count in &breakdown.counts {
                let share = breakdown.share(&count.room_type).unwrap_or(0.0);
                println!("{:<16} {:>5.1}%", count.room_type, share);
            }
            println!();
            println!("{:<16} {:>8}", "Room Type", "Listings");
            for count in breakdown.ranked() {
                println!("{:<16} {:>8}", count.room_type, count.listings);
            }
            Ok(())
        }
        Commands::Histogram {
            neighbourhood,
            room_type,
        } => {
            require_known(dataset.neighbourhoods(), neighbourhood, "neighbourhood")?;
            require_known(dataset.room_types(), room_type, "room type")?;
            let max_price = settings.histogram.max_price;
            let hist = price_histogram(&dataset, neighbourhood, room_type, max_price)?;
            if let OutputFormat::Json = cli.format {
                return print_json(&hist);
            }
            println!(
                "Price Distribution of all {} in {} (excluding prices over {})\n",
                room_type, neighbourhood, max_price
            );
            let widest = hist.counts.iter().copied().max().unwrap_or(0).max(1);
            for (i, count) in hist.counts.iter().enumerate() {
                let bar = "#".repeat(count * 50 / widest);
                println!(
                    "{:>7.1} - {:>7.1} {:>5} {}",
                    hist.edges[i],
                    hist.edges[i + 1],
                    count,
                    bar
                );
            }
            Ok(())
        }
        Commands::Neighbourhoods => print_names(dataset.neighbourhoods(), cli.format),
        Commands::RoomTypes => print_names(dataset.room_types(), cli.format),
        Commands::Landmarks => Ok(()),
    }
}

fn run_listings(
    dataset: &Dataset,
    args: &ListingsArgs,
    settings: &Settings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let area = match &args.landmark {
        Some(name) => AreaSelection::near(name, args.radius, args.unit)?,
        None => AreaSelection::neighbourhoods(args.neighbourhoods.iter().cloned()),
    };
    let criteria = FilterCriteria::new(area, args.room_types.iter().cloned())
        .with_price(PriceRange::from_labels(&args.price_min, &args.price_max)?)
        .with_reviews(args.with_reviews)
        .with_high_availability(args.high_availability);

    let (view, report) = compute(dataset, &criteria, args.sort)?;

    if let Some(target) = &args.map {
        let path = target.as_ref().unwrap_or(&settings.map.output);
        let markers = markers(&view, criteria.area.landmark())?;
        write_geojson(path, &markers, settings.map.center(), settings.map.zoom)
            .with_context(|| format!("cannot write map to {}", path.display()))?;
        info!(path = %path.display(), markers = markers.len(), "wrote map");
    }

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "report": report,
            "listings": view.rows()?,
        })),
        OutputFormat::Text => {
            if let Some(landmark) = criteria.area.landmark() {
                println!(
                    "Listings within {} {} of {}, {}\n",
                    args.radius, args.unit, landmark.name, args.sort
                );
            }
            print_summary(&report.summary);
            print_table(&view)
        }
    }
}

fn print_summary(summary: &Summary) {
    // Whole pounds; blank when nothing matched
    let average = summary
        .average_price
        .map(|p| (p.trunc() as i64).to_string())
        .unwrap_or_default();
    println!("Total Listings       {}", summary.total);
    println!("Average Price (GBP)  {}", average);
    println!("Number of Hosts      {}", summary.host_count);
    println!();
}

fn print_table(view: &FilteredView) -> anyhow::Result<()> {
    println!(
        "{:>20}  {:<50}  {:<24}  {:<16}  {:>7}",
        "ID", "Room Name", "Neighbourhood", "Room Type", "Price"
    );
    for row in view.rows()? {
        let name: String = row.name.chars().take(50).collect();
        println!(
            "{:>20}  {:<50}  {:<24}  {:<16}  {:>7}",
            row.id, name, row.neighbourhood, row.room_type, row.price
        );
    }
    Ok(())
}

fn print_names(names: &[String], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&names),
        OutputFormat::Text => {
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_known(known: &[String], value: &str, what: &str) -> anyhow::Result<()> {
    if !known.iter().any(|k| k == value) {
        bail!("unknown {} '{}'", what, value);
    }
    Ok(())
}
