use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use course_dashboard_metrics::config::{Config, OutputFormat, DEFAULT_CONFIG_FILE};
use course_dashboard_metrics::models::{DashboardMetrics, RosterCounts};
use course_dashboard_metrics::{calendar, loader, metrics, report, sample};

#[derive(Parser)]
#[command(name = "course-dashboard")]
#[command(about = "Dashboard metrics for course offerings and enrollments", long_about = None)]
struct Cli {
    /// Path to a configuration file (defaults to .course-dashboard.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Course export (.json or .csv)
    #[arg(long, value_name = "FILE")]
    courses: Option<PathBuf>,
    /// Enrollment export (.json or .csv)
    #[arg(long, value_name = "FILE")]
    enrollments: Option<PathBuf>,
    #[arg(long)]
    teachers: Option<usize>,
    #[arg(long)]
    participants: Option<usize>,
    #[arg(long)]
    rooms: Option<usize>,
    /// Day to compute the dashboard for (YYYY-MM-DD, defaults to today)
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute dashboard metrics and print them
    Compute {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
    /// Write a demo dataset (courses.json, enrollments.json)
    Sample {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(long, value_name = "DATE")]
        today: Option<NaiveDate>,
    },
    /// Write a default configuration file
    InitConfig,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    debug!(?config, "configuration resolved");
    Ok(config)
}

fn compute_metrics(config: &Config, args: &DatasetArgs) -> anyhow::Result<DashboardMetrics> {
    let courses_path = args
        .courses
        .as_ref()
        .or(config.input.courses.as_ref())
        .context("no course export given; pass --courses or set [input].courses")?;
    let enrollments_path = args
        .enrollments
        .as_ref()
        .or(config.input.enrollments.as_ref())
        .context("no enrollment export given; pass --enrollments or set [input].enrollments")?;

    let dataset = loader::load_dataset(courses_path, enrollments_path)
        .context("failed to load dataset")?;

    let roster = RosterCounts {
        teachers: args.teachers.unwrap_or(config.counts.teachers),
        participants: args.participants.unwrap_or(config.counts.participants),
        rooms: args.rooms.unwrap_or(config.counts.rooms),
    };
    let metrics = match args.today {
        Some(reference) => {
            info!(%reference, "computing dashboard");
            metrics::compute(&dataset.courses, &dataset.enrollments, roster, reference)
        }
        None => {
            info!("computing dashboard for today");
            metrics::compute_today(&dataset.courses, &dataset.enrollments, roster)
        }
    };

    Ok(metrics)
}

fn render(metrics: &DashboardMetrics, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => Ok(report::build_report(metrics)),
        OutputFormat::Json if pretty => {
            serde_json::to_string_pretty(metrics).context("failed to serialize metrics")
        }
        OutputFormat::Json => serde_json::to_string(metrics).context("failed to serialize metrics"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Compute {
            dataset,
            format,
            out,
        } => {
            let metrics = compute_metrics(&config, &dataset)?;
            let rendered = render(
                &metrics,
                format.unwrap_or(config.output.format),
                config.output.pretty,
            )?;

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Metrics written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Report { dataset, out } => {
            let metrics = compute_metrics(&config, &dataset)?;
            let report = report::build_report(&metrics);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Sample { dir, today } => {
            let reference = today.unwrap_or_else(calendar::today);
            let dataset = sample::generate(reference);

            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            loader::write_json(&dir.join("courses.json"), &dataset.courses)?;
            loader::write_json(&dir.join("enrollments.json"), &dataset.enrollments)?;
            println!(
                "Sample data with {} courses and {} enrollments written to {}.",
                dataset.courses.len(),
                dataset.enrollments.len(),
                dir.display()
            );
        }
        Commands::InitConfig => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                anyhow::bail!("{DEFAULT_CONFIG_FILE} already exists; remove it or edit it manually");
            }
            std::fs::write(path, Config::default_toml()?)
                .with_context(|| format!("failed to write {DEFAULT_CONFIG_FILE}"))?;
            println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
        }
    }

    Ok(())
}
