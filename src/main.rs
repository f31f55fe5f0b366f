use analyzer::Analyzer;
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use configuration::{Config, Layout, OutputFormat};
use core_types::{CorrectionMethod, GroupKey, GroupKeys, KeyField, Table};
use std::path::PathBuf;
use std::process::ExitCode;

mod report;

/// The main entry point for the perfstat command-line tool.
fn main() -> ExitCode {
    // A missing .env file is fine; it only carries optional PERFSTAT__* overrides.
    dotenvy::dotenv().ok();

    // Argument errors exit with clap's own status (2).
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Two-sample t-tests on company financial metrics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./perfstat.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// The CSV file holding the observations.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Layout of the CSV file.
    #[arg(long, global = true, value_enum)]
    layout: Option<Layout>,

    /// Directory for the `csv` output format.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// How to present results.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two groups of one metric with a two-sample t-test.
    Compare(CompareArgs),
    /// List the groups of one metric with their descriptive statistics.
    Groups(GroupsArgs),
    /// Compare focus companies against the pooled rest of the table.
    VersusOthers(VersusOthersArgs),
    /// Test each company for a shift in its metrics at a split year.
    PrePost(PrePostArgs),
    /// List the metrics, companies and periods found in the data.
    Metrics,
}

#[derive(Parser)]
struct CompareArgs {
    /// The metric to compare (e.g., "ROE (%)").
    #[arg(long)]
    metric: String,

    /// The first group (e.g., "company=A" or "company=A,period=2016").
    #[arg(long)]
    a: GroupKey,

    /// The second group.
    #[arg(long)]
    b: GroupKey,

    /// Use the pooled-variance Student test instead of Welch's test.
    #[arg(long)]
    equal_variance: bool,
}

#[derive(Parser)]
struct GroupsArgs {
    /// The metric to partition.
    #[arg(long)]
    metric: String,

    /// Key field to partition by; repeat for both.
    #[arg(long, value_enum)]
    by: Vec<KeyField>,
}

#[derive(Parser)]
struct VersusOthersArgs {
    /// Companies to set against the rest of the table.
    #[arg(long, required = true, num_args = 1..)]
    focus: Vec<String>,

    /// Metrics to test; defaults to the configured list, else every metric.
    #[arg(long)]
    metric: Vec<String>,

    /// Multiple-comparison correction applied per metric.
    #[arg(long, value_enum)]
    correction: Option<CorrectionMethod>,
}

#[derive(Parser)]
struct PrePostArgs {
    /// First year of the "post" period.
    #[arg(long)]
    split_year: i32,

    /// Metrics to test; defaults to the configured list, else every metric.
    #[arg(long)]
    metric: Vec<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn run(cli: Cli) -> Result<()> {
    let mut config =
        configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    let _log_guard =
        configuration::init_tracing(&config.logging).context("Failed to initialize logging")?;

    let table = load_table(&config)?;

    let report = match cli.command {
        Commands::Compare(args) => handle_compare(args, &table, &mut config)?,
        Commands::Groups(args) => {
            let analyzer = Analyzer::new(&table, config.analysis.clone());
            let groups = analyzer.groups(&args.metric, GroupKeys::from_fields(&args.by))?;
            report::groups(&groups)?
        }
        Commands::VersusOthers(args) => handle_versus_others(args, &table, &mut config)?,
        Commands::PrePost(args) => {
            let analyzer = Analyzer::new(&table, config.analysis.clone());
            let metrics = analyzer.resolve_metrics(&args.metric)?;
            let entries = analyzer.pre_post(args.split_year, &metrics)?;
            report::pre_post(&entries, &metrics, args.split_year, config.analysis.alpha)?
        }
        Commands::Metrics => report::inventory(&table)?,
    };

    report::emit(&report, &config.output)
}

/// Command-line flags win over file and environment settings.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(data) = &cli.data {
        config.data.path = Some(data.clone());
    }
    if let Some(layout) = cli.layout {
        config.data.layout = layout;
    }
    if let Some(directory) = &cli.output_dir {
        config.output.directory = directory.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
}

fn load_table(config: &Config) -> Result<Table> {
    let path = config
        .data
        .path
        .as_deref()
        .ok_or_else(|| anyhow!("No data file given; pass --data or set data.path"))?;
    dataset::load_table(path, &config.data)
        .with_context(|| format!("Failed to load observations from {}", path.display()))
}

fn handle_compare(args: CompareArgs, table: &Table, config: &mut Config) -> Result<report::Report> {
    if args.equal_variance {
        config.analysis.equal_variance = true;
    }
    let analyzer = Analyzer::new(table, config.analysis.clone());
    let result = analyzer.compare_keys(&args.metric, &args.a, &args.b)?;
    report::comparison(&result, config.analysis.alpha)
}

fn handle_versus_others(
    args: VersusOthersArgs,
    table: &Table,
    config: &mut Config,
) -> Result<report::Report> {
    if let Some(correction) = args.correction {
        config.analysis.correction = correction;
    }
    let analyzer = Analyzer::new(table, config.analysis.clone());
    let metrics = analyzer.resolve_metrics(&args.metric)?;
    let entries = analyzer.versus_others(&args.focus, &metrics)?;

    let skipped = entries.iter().filter(|e| e.outcome.computed().is_none()).count();
    if skipped > 0 {
        tracing::warn!(skipped, "Some comparisons had too little data and were skipped.");
    }
    report::versus_others(&entries, &metrics, config.analysis.alpha)
}
