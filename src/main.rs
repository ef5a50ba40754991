use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use stampscan::core::catalog::{
    CatalogDb, CatalogError, CatalogRepository, DEFAULT_CATALOG_PATH, NewStampRecord, StampRecord,
};
use stampscan::detection::DEFAULT_OUTPUT_DIR;
use stampscan::detection::export::{load_regions, save_regions};
use stampscan::{DisplayMapping, ExportReport, HitMap, LayoutPhase, StampDetector, Viewport};

#[derive(Parser)]
#[command(name = "stampscan")]
#[command(about = "Detect, crop and look up stamps in scanned album pages")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect stamps in an image and save each crop
    Detect(DetectArgs),
    /// Resolve a click on the scaled view of a detected image to its catalog record
    Pick(PickArgs),
    /// Inspect or extend the stamp catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),
}

#[derive(Args)]
struct DetectArgs {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Directory for cropped stamps
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Write a copy of the input with detected stamps outlined
    #[arg(long, value_name = "FILE")]
    annotate: Option<PathBuf>,

    /// Print the detection result as JSON
    #[arg(long)]
    json: bool,

    /// Write the detection result as JSON, for use with `pick --regions`
    #[arg(long, value_name = "FILE")]
    regions_out: Option<PathBuf>,
}

#[derive(Args)]
struct PickArgs {
    /// Path to the image the regions were detected in
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Detection result written by `detect --json` or `detect --regions-out`
    #[arg(long, value_name = "FILE")]
    regions: PathBuf,

    /// Click position in viewport pixels, as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_click)]
    click: (i32, i32),

    /// Viewport size, as WxH
    #[arg(long, value_name = "WxH", value_parser = parse_viewport, default_value = "600x400")]
    viewport: Viewport,

    /// Save the scaled view with stamps outlined
    #[arg(long, value_name = "FILE")]
    render: Option<PathBuf>,

    #[arg(long, value_name = "FILE", default_value = DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Add metadata for a detected stamp
    Add(CatalogAddArgs),
    /// Show the record for a detected stamp path
    Show {
        #[arg(value_name = "PATH")]
        storage_path: String,
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,
    },
    /// List all records, newest first
    List {
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,
    },
}

#[derive(Args)]
struct CatalogAddArgs {
    /// Path of the cropped stamp image
    #[arg(value_name = "PATH")]
    storage_path: String,
    #[arg(long)]
    original: Option<String>,
    #[arg(long)]
    keywords: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    history: Option<String>,
    /// Reference URL (repeatable)
    #[arg(long = "source-url", value_name = "URL")]
    source_urls: Vec<String>,
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,
}

fn parse_click(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x = x.trim().parse().map_err(|e| format!("invalid X: {}", e))?;
    let y = y.trim().parse().map_err(|e| format!("invalid Y: {}", e))?;
    Ok((x, y))
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or("expected WxH")?;
    let w = w.trim().parse().map_err(|e| format!("invalid width: {}", e))?;
    let h = h.trim().parse().map_err(|e| format!("invalid height: {}", e))?;
    Ok(Viewport::new(w, h))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Detect(detect) => {
            let report = run_detection(&detect)?;
            if let Some(out) = &detect.regions_out {
                save_regions(out, &report.regions)?;
            }
            print_report(&report, detect.json)?;
        }
        Command::Pick(pick) => run_pick(pick).await?,
        Command::Catalog(command) => run_catalog(command).await?,
    }

    Ok(())
}

fn run_detection(args: &DetectArgs) -> anyhow::Result<ExportReport> {
    let mut detector = StampDetector::new(&args.output_dir);
    if let Some(debug_dir) = &args.debug_out {
        detector = detector.with_debug(debug_dir)?;
    }

    let img = stampscan::load_image(&args.image_path)?;
    let report = detector.detect_image(&img, &args.image_path)?;

    if let Some(out) = &args.annotate {
        save_image(&stampscan::annotate(&img, &report.regions), out)?;
    }
    Ok(report)
}

fn save_image(img: &image::DynamicImage, path: &Path) -> anyhow::Result<()> {
    img.save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", path.display(), e))
}

fn print_report(report: &ExportReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.regions)?);
        return Ok(());
    }

    println!("\n=== Stamp Detection Results ===");
    println!("Total stamps detected: {}", report.regions.len());
    for (i, region) in report.regions.iter().enumerate() {
        let b = region.bbox;
        println!(
            "  Stamp {} at ({}, {}) size {}x{} -> {}",
            i + 1,
            b.x,
            b.y,
            b.width,
            b.height,
            region.storage_path.display()
        );
    }
    if !report.failures.is_empty() {
        println!("Failed to save {} stamp(s):", report.failures.len());
        for failure in &report.failures {
            println!("  {:?}: {}", failure.bbox, failure.reason);
        }
    }
    Ok(())
}

async fn run_pick(args: PickArgs) -> anyhow::Result<()> {
    let img = stampscan::load_image(&args.image_path)?;
    let regions = load_regions(&args.regions)?;
    for region in regions.iter().filter(|r| !r.bbox.fits_within(img.width(), img.height())) {
        tracing::warn!(
            path = %region.storage_path.display(),
            bbox = ?region.bbox,
            "region lies outside the image"
        );
    }

    let mapping = DisplayMapping::fit((img.width(), img.height()), args.viewport, LayoutPhase::Settled)?;
    if let Some(out) = &args.render {
        let view = mapping.render(&stampscan::annotate(&img, &regions));
        save_image(&view, out)?;
    }

    let hits = HitMap::build(mapping, &regions);
    let Some(region) = hits.resolve(args.click) else {
        println!("No stamp at ({}, {})", args.click.0, args.click.1);
        return Ok(());
    };

    println!(
        "Clicked stamp: {} @ {:?}",
        region.storage_path.display(),
        region.bbox
    );
    let catalog = CatalogDb::open(&args.catalog).await?;
    match catalog.lookup(&region.path_key()).await? {
        Some(record) => print_record(&record),
        None => println!("No catalog entry for this stamp yet."),
    }
    catalog.close().await;
    Ok(())
}

async fn run_catalog(command: CatalogCommand) -> anyhow::Result<()> {
    match command {
        CatalogCommand::Add(add) => {
            let catalog = CatalogDb::open(&add.catalog).await?;
            let record = NewStampRecord {
                original_image_ref: add.original,
                storage_path: add.storage_path,
                search_keywords: add.keywords,
                country: add.country,
                title_suggestion: add.title,
                estimated_price_range: add.price,
                history_notes: add.history,
                source_urls: add.source_urls,
            };
            let result = catalog.insert(&record).await;
            catalog.close().await;
            match result {
                Ok(stored) => print_record(&stored),
                Err(e) if e.downcast_ref::<CatalogError>().is_some() => return Err(e),
                Err(e) => return Err(e.context("Failed to add catalog record")),
            }
        }
        CatalogCommand::Show { storage_path, catalog } => {
            let catalog = CatalogDb::open(&catalog).await?;
            match catalog.lookup(&storage_path).await? {
                Some(record) => print_record(&record),
                None => println!("No catalog entry for {}", storage_path),
            }
            catalog.close().await;
        }
        CatalogCommand::List { catalog } => {
            let catalog = CatalogDb::open(&catalog).await?;
            let records = catalog.list().await?;
            println!("Found {} stamps", records.len());
            for record in &records {
                println!();
                print_record(record);
            }
            catalog.close().await;
        }
    }
    Ok(())
}

fn print_record(record: &StampRecord) {
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
    println!("--- Stamp {} ---", record.id);
    println!("  Image:          {}", record.storage_path);
    println!("  Original image: {}", show(&record.original_image_ref));
    println!("  Title:          {}", show(&record.title_suggestion));
    println!("  Country:        {}", show(&record.country));
    println!("  Keywords:       {}", show(&record.search_keywords));
    println!("  Price range:    {}", show(&record.estimated_price_range));
    println!("  History:        {}", show(&record.history_notes));
    println!("  Added:          {}", record.created_at);
    if record.source_urls.is_empty() {
        println!("  Sources:        N/A");
    } else {
        println!("  Sources:");
        for url in &record.source_urls {
            println!("    - {}", url);
        }
    }
}
