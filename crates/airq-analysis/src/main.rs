//! CLI entry point for the air-quality analysis pipeline.

use airq_analysis::config::DEFAULT_INPUT;
use airq_analysis::{
    AnalysisConfig, AnalysisConfigBuilder, AnalysisResult, Pipeline, Pollutant, ReportStyle,
    TrendTest,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

/// CLI-compatible report style enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReportStyle {
    /// Coverage, peaks and the PM2.5 trend only
    Basic,
    /// Adds column mapping, seasonal table, all trend tests and decomposition
    Detailed,
}

impl From<CliReportStyle> for ReportStyle {
    fn from(cli: CliReportStyle) -> Self {
        match cli {
            CliReportStyle::Basic => ReportStyle::Basic,
            CliReportStyle::Detailed => ReportStyle::Detailed,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Air-quality time-series analysis",
    long_about = "Normalizes a daily air-pollution CSV, reports coverage, peaks and seasonal \
                  averages, tests PM2.5 for a monotonic trend and writes charts plus a \
                  markdown report.\n\n\
                  EXAMPLES:\n  \
                  # Defaults: chicago_air_pollution.csv, 2000-2002, output to .\n  \
                  airq-analysis\n\n  \
                  # Another file and period\n  \
                  airq-analysis -i data.csv --start-year 2005 --end-year 2010 -o out/\n\n  \
                  # Settings from a JSON file, flags still win\n  \
                  airq-analysis --config analysis.json --style basic"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for charts and reports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First year of the analysis period (inclusive)
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year of the analysis period (inclusive)
    #[arg(long)]
    end_year: Option<i32>,

    /// Site name used in chart and report titles
    #[arg(long)]
    site: Option<String>,

    /// Report verbosity
    #[arg(long, value_enum)]
    style: Option<CliReportStyle>,

    /// JSON file with analysis settings
    ///
    /// Fields left out keep their defaults; command-line flags override the file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merge the optional JSON config file with command-line overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    let mut builder = AnalysisConfigBuilder::from_config(base);
    if let Some(ref input) = args.input {
        builder = builder.input_path(input);
    }
    if let Some(ref output) = args.output {
        builder = builder.output_dir(output);
    }
    if let Some(year) = args.start_year {
        builder = builder.start_year(year);
    }
    if let Some(year) = args.end_year {
        builder = builder.end_year(year);
    }
    if let Some(ref site) = args.site {
        builder = builder.site_name(site);
    }
    if let Some(style) = args.style {
        builder = builder.report_style(style.into());
    }
    if args.no_charts {
        builder = builder.render_charts(false);
    }

    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    let config = build_config(&args)?;
    if args.input.is_none() && args.config.is_none() {
        info!("No input given, using {}", DEFAULT_INPUT);
    }

    let quiet = args.quiet;
    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(move |update| {
            if !quiet {
                println!(
                    "[{:>3.0}%] {}: {}",
                    update.progress * 100.0,
                    update.stage.display_name(),
                    update.message
                );
            }
        })
        .build()?;

    match pipeline.run() {
        Ok(result) => {
            print_summary(&result, pipeline.config());
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            if e.is_fatal_input() {
                eprintln!("error[{}]: cannot analyze input: {}", e.error_code(), e);
            }
            Err(anyhow!("Analysis failed: {}", e))
        }
    }
}

/// Print a short human-readable summary.
///
/// Uses `println!` so the summary shows regardless of log level.
fn print_summary(result: &AnalysisResult, config: &AnalysisConfig) {
    println!("\n{}", "=".repeat(60));
    println!("{} air quality, {}", config.site_name, config.period_label());
    println!("{}", "=".repeat(60));

    match result.series.date_range() {
        Some((start, end)) => println!("  Period:   {} to {}", start, end),
        None => println!("  Period:   no records in range"),
    }
    println!("  Records:  {}", result.series.len());

    println!("\n  Coverage:");
    for stat in &result.availability.stats {
        println!(
            "    {:<6} {:>6} ({:.1}%)",
            stat.pollutant.label(),
            stat.count,
            stat.coverage_pct
        );
    }

    let trend = result.headline_trend();
    let line = match trend {
        TrendTest::Computed {
            tau: Some(tau),
            p_value: Some(p),
            n,
        } => {
            let verdict = if trend.is_significant(config.significance_level) {
                "significant"
            } else {
                "not significant"
            };
            format!("tau = {:.3}, p = {:.4} (n = {}, {})", tau, p, n, verdict)
        }
        TrendTest::Computed { n, .. } => format!("undefined, constant series (n = {})", n),
        TrendTest::InsufficientData { n } => format!("insufficient data (n = {})", n),
    };
    println!("\n  {} trend: {}", Pollutant::Pm25.label(), line);

    println!("\n  Files written to {}:", config.output_dir.display());
    for file in &result.generated_files {
        println!("    - {}", file);
    }
    println!();
}
