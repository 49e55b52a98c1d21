use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use oilgas_metrics::app::{
    MetricsFilter, MetricsQueryUseCase, NormalizeUseCase, QualityGateUseCase, ReviewFilter, ReviewQueueUseCase,
    SummaryPeriod, SummaryRequest, SummaryUseCase,
};
use oilgas_metrics::app::ports::MetricSource;
use oilgas_metrics::constants::parse_metric_list;
use oilgas_metrics::observability::{self, init_logging};
use oilgas_metrics::pipeline::processing::normalize::display_value;
use oilgas_metrics::pipeline::processing::quality_gate::DataQualityEvaluator;
use oilgas_metrics::domain::SortSpec;
use oilgas_metrics::{Config, GroupBy, InMemoryMetricStore, MetricRecord, QuarterPeriod};

#[derive(Parser)]
#[command(name = "oilgas-metrics")]
#[command(about = "Unit normalization and data-quality checks for extracted oil & gas metrics")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (falls back to OGM_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print recorded metrics in Prometheus text format to stderr on exit
    #[arg(long, global = true)]
    print_metrics: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a single value into the standard unit of its metric
    Normalize {
        #[arg(long)]
        value: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        /// Internal metric name, e.g. oil_production
        #[arg(long)]
        metric: String,
    },
    /// List one company's metric values with their normalized equivalents
    List {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        company_id: i64,
        /// Period end date (YYYY-MM-DD); wins over --period
        #[arg(long)]
        period_end_date: Option<NaiveDate>,
        /// Fiscal quarter (YYYY-Qn)
        #[arg(long)]
        period: Option<QuarterPeriod>,
        /// Comma-separated internal metric names
        #[arg(long)]
        metrics: Option<String>,
        #[arg(long)]
        basin: Option<String>,
        #[arg(long)]
        segment: Option<String>,
        #[arg(long)]
        confidence_min: Option<f64>,
        /// field:asc or field:desc
        #[arg(long, default_value = "period_end_date:desc")]
        sort_by: String,
    },
    /// Run the quality checks over every record in a file
    Evaluate {
        /// JSON array of metric records
        #[arg(long)]
        input: PathBuf,
    },
    /// Show one record with its normalized value and derived checks
    Detail {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        id: i64,
    },
    /// List records below a confidence threshold, least confident first
    Review {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        company_id: Option<i64>,
        /// Period end date (YYYY-MM-DD)
        #[arg(long)]
        period_end_date: Option<NaiveDate>,
        /// Comma-separated internal metric names
        #[arg(long)]
        metrics: Option<String>,
        /// field:asc or field:desc; `confidence` is accepted for the confidence score
        #[arg(long, default_value = "confidence:asc")]
        sort_by: String,
    },
    /// Aggregate normalized values by company, basin or segment for one period
    Summary {
        #[arg(long)]
        input: PathBuf,
        /// Period end date (YYYY-MM-DD)
        #[arg(long, required_unless_present = "period", conflicts_with = "period")]
        period_end_date: Option<NaiveDate>,
        /// Fiscal quarter (YYYY-Qn)
        #[arg(long)]
        period: Option<QuarterPeriod>,
        /// Comma-separated internal metric names
        #[arg(long)]
        metrics: Option<String>,
        #[arg(long, default_value = "company")]
        group_by: GroupBy,
        /// Comma-separated company ids
        #[arg(long, value_delimiter = ',')]
        company_ids: Vec<i64>,
        #[arg(long)]
        confidence_min: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    init_logging();

    if cli.print_metrics {
        observability::metrics::init()?;
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let result = run(cli.command, &config);
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }

    if cli.print_metrics {
        if let Some(rendered) = observability::metrics::render() {
            eprintln!("{}", rendered);
        }
    }

    result
}

fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Normalize { value, unit, metric } => {
            let record = MetricRecord::new(0, 0, metric.as_str(), value, unit.as_deref());
            let normalized = NormalizeUseCase::default().normalize_record(&record);
            let (shown_value, shown_unit) = display_value(
                value,
                unit.as_deref(),
                normalized.normalized.value,
                normalized.normalized.unit.as_deref(),
            );

            let mut output = serde_json::to_value(&normalized.normalized)?;
            output["display_value"] = json!(shown_value);
            output["display_unit"] = json!(shown_unit);
            print_json(&output)
        }
        Commands::List {
            input,
            company_id,
            period_end_date,
            period,
            metrics,
            basin,
            segment,
            confidence_min,
            sort_by,
        } => {
            let store = load_store(&input)?;
            let filter = MetricsFilter {
                company_id,
                period_end_date,
                quarter: period,
                metric_names: metrics.as_deref().map(parse_metric_list).unwrap_or_default(),
                basin,
                segment,
                confidence_min,
                sort: Some(SortSpec::for_listing(&sort_by)?),
            };
            let rows = MetricsQueryUseCase::default().list(&store, &filter)?;
            print_json(&rows)
        }
        Commands::Evaluate { input } => {
            let store = load_store(&input)?;
            let records = store.all_records();
            let use_case = QualityGateUseCase::new(DataQualityEvaluator::with_config(config.quality.clone()));

            let output: Vec<serde_json::Value> = use_case
                .assess_batch(&records, &store)
                .into_iter()
                .map(|evaluation| match evaluation.checks {
                    Ok(checks) => json!({ "metric_value_id": evaluation.metric_value_id, "checks": checks }),
                    Err(e) => json!({ "metric_value_id": evaluation.metric_value_id, "error": e.to_string() }),
                })
                .collect();
            print_json(&output)
        }
        Commands::Detail { input, id } => {
            let store = load_store(&input)?;
            let use_case = QualityGateUseCase::new(DataQualityEvaluator::with_config(config.quality.clone()));
            let detail = use_case.describe(&store, id)?;
            print_json(&detail)
        }
        Commands::Review {
            input,
            threshold,
            company_id,
            period_end_date,
            metrics,
            sort_by,
        } => {
            let store = load_store(&input)?;
            let filter = ReviewFilter {
                threshold,
                company_id,
                period_end_date,
                metric_names: metrics.as_deref().map(parse_metric_list).unwrap_or_default(),
                sort: Some(SortSpec::for_review(&sort_by)?),
            };
            let items = ReviewQueueUseCase::new(config.review.clone()).queue(&store, &filter)?;
            print_json(&items)
        }
        Commands::Summary {
            input,
            period_end_date,
            period,
            metrics,
            group_by,
            company_ids,
            confidence_min,
        } => {
            let store = load_store(&input)?;
            let period = match (period_end_date, period) {
                (Some(date), _) => SummaryPeriod::EndDate(date),
                (None, Some(quarter)) => SummaryPeriod::Quarter(quarter),
                (None, None) => anyhow::bail!("Either --period-end-date or --period is required"),
            };

            let mut request = SummaryRequest::new(period);
            request.metric_names = metrics.as_deref().map(parse_metric_list).unwrap_or_default();
            request.group_by = group_by;
            request.company_ids = company_ids;
            request.confidence_min = confidence_min;

            let summaries = SummaryUseCase::default().summarize(&store, &request)?;
            print_json(&summaries)
        }
    }
}

fn load_store(path: &Path) -> anyhow::Result<InMemoryMetricStore> {
    let store = InMemoryMetricStore::from_json_file(path)
        .with_context(|| format!("Failed to load metric records from {}", path.display()))?;
    info!(records = store.len(), "Metric store ready");
    Ok(store)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
