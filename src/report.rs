//! Post-run analysis and report rendering.
//!
//! [`analyze`] is a pure function of the finalized metrics and the run
//! configuration. Rendering is separate: [`format_text`], [`format_markdown`]
//! and [`format_json`] only read a [`PerformanceReport`].

use crate::cli::OutputFormat;
use crate::config::RunConfig;
use crate::worker::WorkerSummary;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use loadtest_metrics::{mean, Counters, FinalMetrics};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Below this efficiency (percent) on either axis the run is flagged as
/// degraded by contention.
pub const CONTENTION_THRESHOLD_PCT: f64 = 95.0;

/// Average bulk write latency above which indexing tuning is suggested.
pub const INDEXING_LATENCY_LIMIT: Duration = Duration::from_millis(500);

/// Average query latency above which query tuning is suggested.
pub const QUERY_LATENCY_LIMIT: Duration = Duration::from_millis(200);

/// Derived figures for one operation class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    /// Documents indexed, or queries executed.
    pub total: u64,
    pub errors: u64,
    /// Items per second of elapsed time.
    pub throughput: f64,
    #[serde(rename = "avg_latency_ms", serialize_with = "as_millis")]
    pub avg_latency: Duration,
    /// Configured rate times configured duration.
    pub expected: f64,
    pub efficiency_pct: f64,
}

/// Contention verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Contention {
    /// Both efficiencies at or above the threshold.
    Minimal,
    /// At least one efficiency below the threshold. Impacts are
    /// `100 - efficiency` for each axis.
    Degraded {
        indexing_impact_pct: f64,
        query_impact_pct: f64,
    },
}

impl Contention {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Contention::Degraded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Average indexing latency above [`INDEXING_LATENCY_LIMIT`].
    TuneIndexing,
    /// Average query latency above [`QUERY_LATENCY_LIMIT`].
    OptimizeQueries,
    /// At least one operation failed.
    InvestigateErrors,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::TuneIndexing => "Consider optimizing bulk size or indexing rate",
            Recommendation::OptimizeQueries => "Consider query optimization or caching strategies",
            Recommendation::InvestigateErrors => "Investigate error patterns and system stability",
        };
        f.write_str(text)
    }
}

/// Final report of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Measured wall-clock duration.
    pub elapsed_secs: f64,
    pub configured_duration_secs: f64,
    pub index_rate: f64,
    pub query_rate: f64,
    pub bulk_size: usize,
    pub indexing: OperationStats,
    pub querying: OperationStats,
    pub contention: Contention,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workers: Vec<WorkerSummary>,
}

impl PerformanceReport {
    /// Attach per-worker summaries for the worker table.
    pub fn with_workers(mut self, workers: Vec<WorkerSummary>) -> Self {
        self.workers = workers;
        self
    }
}

/// Derive the report from the final metrics of a run.
pub fn analyze(metrics: &FinalMetrics, config: &RunConfig) -> PerformanceReport {
    let elapsed = metrics.elapsed.as_secs_f64();
    let counters = &metrics.counters;

    let indexing = operation_stats(
        counters.documents_indexed,
        counters.indexing_errors,
        &metrics.indexing_latency,
        elapsed,
        config.expected_indexed(),
    );
    let querying = operation_stats(
        counters.queries_executed,
        counters.query_errors,
        &metrics.query_latency,
        elapsed,
        config.expected_queries(),
    );

    let contention = contention(indexing.efficiency_pct, querying.efficiency_pct);
    let recommendations = recommendations(indexing.avg_latency, querying.avg_latency, counters);

    PerformanceReport {
        elapsed_secs: elapsed,
        configured_duration_secs: config.duration.as_secs_f64(),
        index_rate: config.index_rate,
        query_rate: config.query_rate,
        bulk_size: config.bulk_size,
        indexing,
        querying,
        contention,
        recommendations,
        workers: Vec::new(),
    }
}

fn operation_stats(
    total: u64,
    errors: u64,
    samples: &[Duration],
    elapsed_secs: f64,
    expected: f64,
) -> OperationStats {
    let throughput = throughput(total, elapsed_secs);
    OperationStats {
        total,
        errors,
        throughput,
        avg_latency: mean(samples),
        expected,
        efficiency_pct: efficiency_pct(throughput, elapsed_secs, expected),
    }
}

/// Items per second; zero when no time has elapsed.
pub fn throughput(total: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        total as f64 / elapsed_secs
    } else {
        0.0
    }
}

/// `(throughput * elapsed / expected) * 100`; zero when nothing was expected.
pub fn efficiency_pct(throughput: f64, elapsed_secs: f64, expected: f64) -> f64 {
    if expected > 0.0 {
        (throughput * elapsed_secs / expected) * 100.0
    } else {
        0.0
    }
}

pub fn contention(indexing_efficiency: f64, query_efficiency: f64) -> Contention {
    if indexing_efficiency < CONTENTION_THRESHOLD_PCT || query_efficiency < CONTENTION_THRESHOLD_PCT
    {
        Contention::Degraded {
            indexing_impact_pct: 100.0 - indexing_efficiency,
            query_impact_pct: 100.0 - query_efficiency,
        }
    } else {
        Contention::Minimal
    }
}

/// Each rule is checked on its own; any combination can apply.
pub fn recommendations(
    avg_indexing_latency: Duration,
    avg_query_latency: Duration,
    counters: &Counters,
) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if avg_indexing_latency > INDEXING_LATENCY_LIMIT {
        out.push(Recommendation::TuneIndexing);
    }
    if avg_query_latency > QUERY_LATENCY_LIMIT {
        out.push(Recommendation::OptimizeQueries);
    }
    if counters.has_errors() {
        out.push(Recommendation::InvestigateErrors);
    }
    out
}

/// Render a report in the requested format.
pub fn render(report: &PerformanceReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(report)),
        OutputFormat::Markdown => Ok(format_markdown(report)),
        OutputFormat::Json => Ok(format_json(report)?),
    }
}

/// Human-readable report with a per-worker table.
pub fn format_text(report: &PerformanceReport) -> String {
    let mut output = String::new();

    output.push_str("\n🎯 ===== CONCURRENT READ/WRITE PERFORMANCE REPORT =====\n");
    output.push_str(&format!(
        "Test Duration: {:.1} seconds\n",
        report.elapsed_secs
    ));
    output.push_str(&format!(
        "Configuration: {} bulk req/sec indexing ({} docs each), {} QPS querying\n",
        report.index_rate, report.bulk_size, report.query_rate
    ));

    output.push_str("\n📥 INDEXING PERFORMANCE:\n");
    output.push_str(&format!(
        "  Total Documents Indexed: {}\n",
        format_number(report.indexing.total)
    ));
    output.push_str(&format!(
        "  Indexing Throughput: {:.2} docs/sec\n",
        report.indexing.throughput
    ));
    output.push_str(&format!(
        "  Average Indexing Latency: {}\n",
        format_latency(report.indexing.avg_latency)
    ));
    output.push_str(&format!(
        "  Indexing Errors: {}\n",
        format_number(report.indexing.errors)
    ));

    output.push_str("\n🔍 QUERY PERFORMANCE:\n");
    output.push_str(&format!(
        "  Total Queries Executed: {}\n",
        format_number(report.querying.total)
    ));
    output.push_str(&format!(
        "  Query Throughput: {:.2} QPS\n",
        report.querying.throughput
    ));
    output.push_str(&format!(
        "  Average Query Latency: {}\n",
        format_latency(report.querying.avg_latency)
    ));
    output.push_str(&format!(
        "  Query Errors: {}\n",
        format_number(report.querying.errors)
    ));

    output.push_str("\n⚡ CONCURRENT OPERATION ANALYSIS:\n");
    output.push_str(&format!(
        "  Indexing Efficiency: {:.1}% (expected vs actual)\n",
        report.indexing.efficiency_pct
    ));
    output.push_str(&format!(
        "  Querying Efficiency: {:.1}% (expected vs actual)\n",
        report.querying.efficiency_pct
    ));

    output.push_str("\n🔄 RESOURCE CONTENTION IMPACT:\n");
    match &report.contention {
        Contention::Degraded {
            indexing_impact_pct,
            query_impact_pct,
        } => {
            output.push_str("  ⚠️  Performance degradation detected - resource contention likely\n");
            output.push_str(&format!(
                "  Indexing impact: {indexing_impact_pct:.1}% degradation\n"
            ));
            output.push_str(&format!("  Query impact: {query_impact_pct:.1}% degradation\n"));
        }
        Contention::Minimal => {
            output.push_str(
                "  ✅ Minimal resource contention - system handling concurrent load well\n",
            );
        }
    }

    output.push_str("\n💡 PERFORMANCE RECOMMENDATIONS:\n");
    for recommendation in &report.recommendations {
        output.push_str(&format!("  - {recommendation}\n"));
    }

    if !report.workers.is_empty() {
        output.push('\n');
        output.push_str(&worker_table(&report.workers).to_string());
        output.push('\n');
    }

    output
}

fn worker_table(workers: &[WorkerSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Worker", "Backend", "Kind", "Ticks", "OK", "Failed", "Items",
    ]);

    for worker in workers {
        let failed_cell = if worker.failed > 0 {
            Cell::new(format_number(worker.failed)).fg(Color::Red)
        } else {
            Cell::new("0").fg(Color::Green)
        };

        table.add_row(vec![
            Cell::new(&worker.name),
            Cell::new(worker.backend),
            Cell::new(worker.kind),
            Cell::new(format_number(worker.ticks)),
            Cell::new(format_number(worker.succeeded)),
            failed_cell,
            Cell::new(format_number(worker.items)),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format_number(workers.iter().map(|w| w.ticks).sum())),
        Cell::new(format_number(workers.iter().map(|w| w.succeeded).sum())),
        Cell::new(format_number(workers.iter().map(|w| w.failed).sum())),
        Cell::new(format_number(workers.iter().map(|w| w.items).sum())),
    ]);

    table
}

/// Report as a markdown document.
pub fn format_markdown(report: &PerformanceReport) -> String {
    let mut output = String::new();

    output.push_str("# Concurrent Read/Write Performance Report\n\n");
    output.push_str("## Summary\n\n");
    output.push_str(&format!(
        "- **Test Duration:** {:.1}s (configured {:.1}s)\n",
        report.elapsed_secs, report.configured_duration_secs
    ));
    output.push_str(&format!(
        "- **Configuration:** {} bulk req/sec indexing ({} docs each), {} QPS querying\n\n",
        report.index_rate, report.bulk_size, report.query_rate
    ));

    output.push_str("## Operations\n\n");
    output.push_str("| Operation | Total | Throughput | Avg Latency | Errors | Efficiency |\n");
    output.push_str("|-----------|-------|------------|-------------|--------|------------|\n");
    for (label, stats) in [("Indexing", &report.indexing), ("Querying", &report.querying)] {
        output.push_str(&format!(
            "| {} | {} | {:.2}/s | {} | {} | {:.1}% |\n",
            label,
            format_number(stats.total),
            stats.throughput,
            format_latency(stats.avg_latency),
            format_number(stats.errors),
            stats.efficiency_pct
        ));
    }

    output.push_str("\n## Resource Contention\n\n");
    match &report.contention {
        Contention::Degraded {
            indexing_impact_pct,
            query_impact_pct,
        } => {
            output.push_str("Performance degradation detected, resource contention likely.\n\n");
            output.push_str(&format!(
                "- **Indexing impact:** {indexing_impact_pct:.1}%\n"
            ));
            output.push_str(&format!("- **Query impact:** {query_impact_pct:.1}%\n"));
        }
        Contention::Minimal => output.push_str("Minimal resource contention.\n"),
    }

    if !report.recommendations.is_empty() {
        output.push_str("\n## Recommendations\n\n");
        for recommendation in &report.recommendations {
            output.push_str(&format!("- {recommendation}\n"));
        }
    }

    if !report.workers.is_empty() {
        output.push_str("\n## Workers\n\n");
        output.push_str("| Worker | Ticks | OK | Failed | Items |\n");
        output.push_str("|--------|-------|----|--------|-------|\n");
        for worker in &report.workers {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                worker.name,
                format_number(worker.ticks),
                format_number(worker.succeeded),
                format_number(worker.failed),
                format_number(worker.items)
            ));
        }
    }

    output
}

pub fn format_json(report: &PerformanceReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

fn format_latency(latency: Duration) -> String {
    format!("{:.2}ms", latency.as_secs_f64() * 1000.0)
}

/// Format number with thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}
