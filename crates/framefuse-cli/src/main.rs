//! framefuse CLI — command-line front-end for the data-fusion core.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use framefuse::{
    extract_mask_polygon, interpolate_polygons, list_files, minimum_area_bbox, rdp_simplify,
    rdp_simplify_budget, resample_all, resample_vectors_auto, PhysicalFileSystem, Polygon,
    ResampleOptions, ResamplePolicy, SampleVector, SortMode,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "framefuse")]
#[command(about = "Trace, simplify and morph mask polygons; resample curves; list frame files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace the boundary polygon of a mask region in an image.
    Trace(TraceArgs),

    /// Simplify a polygon (JSON array of [x, y] points).
    Simplify(SimplifyArgs),

    /// Minimum-area oriented bounding box of a polygon.
    Bbox(BboxArgs),

    /// Interpolate two polygons by a blend factor.
    Morph(MorphArgs),

    /// Resample curves (JSON array of curves) onto a shared time base.
    Resample(ResampleArgs),

    /// List frame files under a directory in concatenation order.
    ListFiles(ListFilesArgs),
}

#[derive(Debug, Clone, Args)]
struct TraceArgs {
    /// Path to the mask image.
    #[arg(long)]
    image: PathBuf,

    /// Foreground pixel value of the region to trace.
    #[arg(long, default_value = "255.0")]
    foreground: f64,

    /// Expansion-only RDP epsilon applied to long outlines (0 disables).
    #[arg(long, default_value = "0.0")]
    epsilon: f64,

    /// Seed pixel x; with --seed-y, selects which region to trace.
    #[arg(long)]
    seed_x: Option<u32>,

    /// Seed pixel y.
    #[arg(long)]
    seed_y: Option<u32>,
}

#[derive(Debug, Clone, Args)]
struct SimplifyArgs {
    /// Path to the polygon JSON.
    #[arg(long)]
    polygon: PathBuf,

    /// Expansion-only RDP epsilon.
    #[arg(long, default_value = "0.0")]
    epsilon: f64,

    /// Simplify to a point budget instead of an epsilon.
    #[arg(long)]
    max_points: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct BboxArgs {
    /// Path to the polygon JSON.
    #[arg(long)]
    polygon: PathBuf,

    /// Skip the convexity check (input is already convex).
    #[arg(long)]
    assume_convex: bool,
}

#[derive(Debug, Clone, Args)]
struct MorphArgs {
    /// Path to the first polygon JSON.
    #[arg(long)]
    from: PathBuf,

    /// Path to the second polygon JSON.
    #[arg(long)]
    to: PathBuf,

    /// Blend factor in [0, 1].
    #[arg(long)]
    advance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliPolicy {
    Union,
    Intersection,
}

#[derive(Debug, Clone, Args)]
struct ResampleArgs {
    /// Path to the curves JSON: an array of arrays of [time, value].
    #[arg(long)]
    curves: PathBuf,

    /// Time-base policy across curves.
    #[arg(long, value_enum, default_value_t = CliPolicy::Union)]
    policy: CliPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliSort {
    Alphabetical,
    Reversed,
    TrailingNumber,
}

#[derive(Debug, Clone, Args)]
struct ListFilesArgs {
    /// Directory to scan.
    #[arg(long)]
    dir: String,

    /// Accepted file suffixes (repeatable); empty accepts everything.
    #[arg(long)]
    suffix: Vec<String>,

    #[arg(long, value_enum, default_value_t = CliSort::Alphabetical)]
    sort: CliSort,

    #[arg(long)]
    recursive: bool,
}

fn read_polygon(path: &PathBuf) -> CliResult<Polygon> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_trace(args: &TraceArgs) -> CliResult<()> {
    let image = image::open(&args.image)?.to_luma8();
    let seed = match (args.seed_x, args.seed_y) {
        (Some(x), Some(y)) => Some((x, y)),
        _ => None,
    };
    let polygon = extract_mask_polygon(&image, args.foreground, args.epsilon, seed);
    if polygon.is_empty() {
        return Err("no region with the requested foreground value".into());
    }
    print_json(&polygon)
}

fn run_simplify(args: &SimplifyArgs) -> CliResult<()> {
    let polygon = read_polygon(&args.polygon)?;
    let simplified = match args.max_points {
        Some(budget) => rdp_simplify_budget(&polygon, budget),
        None => rdp_simplify(&polygon, args.epsilon),
    };
    print_json(&simplified)
}

fn run_bbox(args: &BboxArgs) -> CliResult<()> {
    let polygon = read_polygon(&args.polygon)?;
    let rect = minimum_area_bbox(&polygon, !args.assume_convex);
    print_json(&rect)
}

fn run_morph(args: &MorphArgs) -> CliResult<()> {
    let from = read_polygon(&args.from)?;
    let to = read_polygon(&args.to)?;
    print_json(&interpolate_polygons(&from, &to, args.advance))
}

fn run_resample(args: &ResampleArgs) -> CliResult<()> {
    let data = std::fs::read_to_string(&args.curves)?;
    let mut curves: Vec<SampleVector> = serde_json::from_str(&data)?;
    let resampled = match args.policy {
        CliPolicy::Union => resample_vectors_auto(&curves),
        CliPolicy::Intersection => {
            if !resample_all(
                &mut curves,
                ResampleOptions {
                    policy: ResamplePolicy::Intersection,
                    ..Default::default()
                },
            ) {
                return Err("curves do not overlap in time".into());
            }
            curves
        }
    };
    print_json(&resampled)
}

fn run_list_files(args: &ListFilesArgs) -> CliResult<()> {
    let suffixes: Vec<&str> = args.suffix.iter().map(String::as_str).collect();
    let sort = match args.sort {
        CliSort::Alphabetical => SortMode::Alphabetical,
        CliSort::Reversed => SortMode::Reversed,
        CliSort::TrailingNumber => SortMode::TrailingNumber,
    };
    let files = list_files(
        &PhysicalFileSystem,
        &args.dir,
        &suffixes,
        sort,
        args.recursive,
    );
    for file in files {
        println!("{file}");
    }
    Ok(())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Trace(args) => run_trace(args),
        Commands::Simplify(args) => run_simplify(args),
        Commands::Bbox(args) => run_bbox(args),
        Commands::Morph(args) => run_morph(args),
        Commands::Resample(args) => run_resample(args),
        Commands::ListFiles(args) => run_list_files(args),
    }
}
