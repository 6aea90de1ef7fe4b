// Entry point and high-level CLI flow.
//
// - `map` loads both files and shows which column feeds each report field.
// - `values` lists what can be filtered on: object types, violation names
//   and the span of inspection dates.
// - `build` computes the report, prints it and optionally exports the
//   spreadsheet grid (CSV) and the raw result (JSON).
use clap::{Args, Parser, Subcommand};
use district_report::loader::{load_records, LoadedSheet};
use district_report::mapping::{OBJECT_FIELDS, VIOLATION_FIELDS};
use district_report::output;
use district_report::reports::{build_report, collect_unique_values, extract_unique_dates};
use district_report::settings::{parse_override, parse_period_text, PeriodSettings, Settings};
use district_report::types::{DataSourceMode, FieldKey, SelectionMode};
use district_report::util::{format_display_date, format_integer};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "district_report",
    version,
    about = "District compliance report from a violations log and an object registry"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how the columns of both files map onto report fields.
    Map(SourceArgs),
    /// List distinct object types, violation names and inspection dates.
    Values(SourceArgs),
    /// Build the report.
    Build(BuildArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Violations file (.csv or .json).
    #[arg(long)]
    violations: PathBuf,
    /// Object registry file (.csv or .json).
    #[arg(long)]
    objects: PathBuf,
    /// TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override a violations column, e.g. `status=Статус`. Repeatable.
    #[arg(long = "map-violation", value_parser = parse_override_arg)]
    map_violation: Vec<(FieldKey, String)>,
    /// Override an objects column, e.g. `objectName=Наименование`. Repeatable.
    #[arg(long = "map-object", value_parser = parse_override_arg)]
    map_object: Vec<(FieldKey, String)>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    files: SourceArgs,
    /// Current period, DD.MM.YYYY-DD.MM.YYYY.
    #[arg(long, value_parser = parse_current)]
    current: Option<PeriodSettings>,
    /// Previous period, DD.MM.YYYY-DD.MM.YYYY.
    #[arg(long, value_parser = parse_previous)]
    previous: Option<PeriodSettings>,
    /// Object type to include (at most three). Repeatable.
    #[arg(long = "type")]
    selected_types: Vec<String>,
    /// Violation name to include. Repeatable.
    #[arg(long = "violation")]
    selected_violations: Vec<String>,
    /// Data source: all, oati or cafap.
    #[arg(long)]
    source: Option<DataSourceMode>,
    /// Write the report grid as CSV.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Write the raw report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn parse_override_arg(s: &str) -> Result<(FieldKey, String), String> {
    parse_override(s).map_err(|e| e.to_string())
}

fn parse_current(s: &str) -> Result<PeriodSettings, String> {
    parse_period_text(s, "current").map_err(|e| e.to_string())
}

fn parse_previous(s: &str) -> Result<PeriodSettings, String> {
    parse_period_text(s, "previous").map_err(|e| e.to_string())
}

struct Inputs {
    settings: Settings,
    violations: LoadedSheet,
    objects: LoadedSheet,
}

/// Load both files and the settings, with command-line mapping overrides on top.
fn load_inputs(args: SourceArgs) -> Result<Inputs, Box<dyn Error>> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.violation_mapping.extend(args.map_violation);
    settings.object_mapping.extend(args.map_object);

    let (violations, _) = load_records(&args.violations)?;
    let (objects, _) = load_records(&args.objects)?;
    Ok(Inputs {
        settings,
        violations,
        objects,
    })
}

fn handle_map(args: SourceArgs) -> Result<(), Box<dyn Error>> {
    let inputs = load_inputs(args)?;
    let (vmap, omap) = inputs
        .settings
        .resolve_mappings(&inputs.violations.headers, &inputs.objects.headers)?;
    output::preview_mapping("Violations", &vmap, VIOLATION_FIELDS);
    output::preview_mapping("Objects", &omap, OBJECT_FIELDS);
    Ok(())
}

fn handle_values(args: SourceArgs) -> Result<(), Box<dyn Error>> {
    let inputs = load_inputs(args)?;
    let (vmap, _) = inputs
        .settings
        .resolve_mappings(&inputs.violations.headers, &inputs.objects.headers)?;
    let records = &inputs.violations.records;

    println!("Object types:");
    for value in collect_unique_values(records, vmap.get(FieldKey::ObjectType)) {
        println!("  {}", value);
    }
    println!("Violation names:");
    for value in collect_unique_values(records, vmap.get(FieldKey::ViolationName)) {
        println!("  {}", value);
    }
    let dates = extract_unique_dates(records, vmap.get(FieldKey::InspectionDate));
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => println!(
            "Inspection dates: {} – {} ({} distinct)",
            format_display_date(*first),
            format_display_date(*last),
            format_integer(dates.len())
        ),
        _ => println!("Inspection dates: none"),
    }
    Ok(())
}

fn handle_build(args: BuildArgs) -> Result<(), Box<dyn Error>> {
    let mut inputs = load_inputs(args.files)?;
    let settings = &mut inputs.settings;
    if args.current.is_some() {
        settings.current = args.current;
    }
    if args.previous.is_some() {
        settings.previous = args.previous;
    }
    if !args.selected_types.is_empty() {
        settings.types = args.selected_types;
        settings.type_mode = Some(SelectionMode::Custom);
    }
    if !args.selected_violations.is_empty() {
        settings.violations = args.selected_violations;
        settings.violation_mode = Some(SelectionMode::Custom);
    }
    if args.source.is_some() {
        settings.data_source = args.source;
    }

    let config = inputs
        .settings
        .into_config(&inputs.violations.headers, &inputs.objects.headers)?;
    let result = build_report(&inputs.violations.records, &inputs.objects.records, &config)?;
    info!(districts = result.rows.len(), "report built");

    output::preview_report(&result, &config);

    if let Some(path) = &args.out {
        let grid = output::build_sheet_grid(&result, &config);
        output::write_sheet_csv(path, &grid)?;
        println!("(Report grid exported to {})", path.display());
    }
    if let Some(path) = &args.json {
        output::write_json(path, &result)?;
        println!("(Report data exported to {})", path.display());
    }
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Map(args) => handle_map(args),
        Command::Values(args) => handle_values(args),
        Command::Build(args) => handle_build(args),
    };
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
