use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use thesis_sunburst::hierarchy::{RebalanceReport, filter_options, suggest_filters};
use thesis_sunburst::layout::NodeSummary;
use thesis_sunburst::util::{ellipsize, format_count};
use thesis_sunburst::{EngineConfig, Query, Snapshot, SortOrder, View, load_records};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON array of thesis records.
    #[arg(long)]
    records: PathBuf,
    #[arg(long, value_enum, default_value_t = SortOrder::LevelCategoryYear)]
    sort: SortOrder,
    /// Degree name to restrict the chart to (first 32 characters).
    #[arg(long)]
    filter: Option<String>,
    #[arg(long)]
    threshold: Option<usize>,
    #[arg(long)]
    max_depth: Option<usize>,
    /// Dot-joined path of the node to center the chart on.
    #[arg(long)]
    zoom: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,
    /// Print the available filter values instead of the chart.
    #[arg(long)]
    list_filters: bool,
    /// Rank filter values against this text (implies --list-filters).
    #[arg(long)]
    suggest: Option<String>,
}

#[derive(Serialize)]
struct ChartReport<'a> {
    query: &'a Query,
    center: NodeSummary,
    rebalance: RebalanceReport,
    view: View,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let records = load_records(&args.records)
        .with_context(|| format!("failed to load records from {}", args.records.display()))?;

    if args.list_filters || args.suggest.is_some() {
        let options = filter_options(&records, config.filter_key_len);
        let listed = match &args.suggest {
            Some(query) => suggest_filters(&options, query, 10),
            None => options.iter().map(String::as_str).collect(),
        };
        for option in listed {
            println!("{option}");
        }
        return Ok(());
    }

    let query = Query::new(args.sort, args.filter.clone());
    let mut snapshot =
        Snapshot::build(&records, query, &config).context("failed to build the sunburst tree")?;

    if let Some(path) = &args.zoom {
        let target = snapshot
            .sunburst()
            .find_by_path(path)
            .ok_or_else(|| anyhow!("no node at path {path:?}"))?;
        snapshot = snapshot.focus(target)?;
    }

    let view = snapshot.view()?;
    let center = snapshot.center_summary()?;

    match args.format {
        OutputFormat::Json => {
            let report = ChartReport {
                query: snapshot.query(),
                center,
                rebalance: snapshot.report(),
                view,
            };
            let json = serde_json::to_string_pretty(&report).context("failed to serialize chart")?;
            println!("{json}");
        }
        OutputFormat::Summary => print_summary(&center, &view, snapshot.report()),
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.rebalance.threshold = threshold;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_visible_depth = max_depth;
    }
    config.validate().context("invalid command-line settings")?;
    Ok(config)
}

fn print_summary(center: &NodeSummary, view: &View, report: RebalanceReport) {
    let trail = if center.breadcrumbs.is_empty() {
        center.name.clone()
    } else {
        center.breadcrumbs.join(" > ")
    };
    println!(
        "{trail}: {} downloads, {} theses",
        format_count(center.downloads),
        center.theses
    );

    if view.sectors.is_empty() {
        println!("  (nothing to show)");
    }

    for sector in &view.sectors {
        let indent = "  ".repeat(sector.depth_band);
        let marker = if sector.overflow { "*" } else { "" };
        println!(
            "{indent}{}{marker}  {} downloads  {} theses  {:.1}°",
            ellipsize(&sector.name, 40),
            format_count(sector.metric_sum),
            sector.leaf_count,
            sector.angle_span.to_degrees()
        );
    }

    if report.rebalanced_nodes > 0 {
        println!(
            "grouped {} children under {} overflow blocks (*)",
            report.moved_children, report.rebalanced_nodes
        );
    }
}
