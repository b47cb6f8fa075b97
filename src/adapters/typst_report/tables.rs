//! Table formatting for reports.
//!
//! Provides functions to generate Typst markup for:
//! - Run summary (period, instruments, benchmark source)
//! - Metrics comparison across the three NAV series
//! - Target-probability and win-rate table
//! - Skipped-code list

use crate::domain::backtest::{BenchmarkSource, SeriesKind};
use crate::domain::metrics::{Metrics, PerformanceReport};
use crate::domain::probability::AnalysisResult;
use crate::domain::universe::SkippedCode;
use crate::ports::report_port::ReportInput;

use super::labels::{ReportLabels, Text};

/// Percent-unit value with two decimals. NaN prints as N/A.
pub fn fmt_pct(value: f64) -> String {
    if value.is_nan() {
        "N/A".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "∞".to_string() } else { "-∞".to_string() }
    } else {
        format!("{:.2}%", value)
    }
}

pub fn fmt_ratio(value: f64) -> String {
    if value.is_nan() {
        "N/A".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "∞".to_string() } else { "-∞".to_string() }
    } else {
        format!("{:.2}", value)
    }
}

/// Fraction in [0, 1] shown as a percentage.
pub fn fmt_fraction(value: f64) -> String {
    fmt_pct(value * 100.0)
}

/// Escape characters with markup meaning inside Typst content blocks.
pub fn typst_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '#' | '*' | '_' | '[' | ']' | '$' | '@' | '<' | '>' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn header_row(labels: &ReportLabels, first: Text) -> String {
    let mut row = format!("  [*{}*],", labels.text(first));
    for kind in SeriesKind::ALL {
        row.push_str(&format!(" [*{}*],", labels.series(kind)));
    }
    row.push('\n');
    row
}

pub fn render_run_summary(input: &ReportInput<'_>, labels: &ReportLabels) -> String {
    let calendar = input.result.calendar();
    let period = match (calendar.first(), calendar.last()) {
        (Some(first), Some(last)) => format!("{} ~ {} ({} d)", first, last, calendar.len()),
        _ => labels.text(Text::NoData).to_string(),
    };

    let instruments = input
        .result
        .universe
        .codes
        .iter()
        .map(|code| typst_escape(&labels.instrument(code)))
        .collect::<Vec<_>>()
        .join(", ");

    let benchmark = match input.result.benchmark_source {
        BenchmarkSource::External => labels.series(SeriesKind::Benchmark),
        BenchmarkSource::Composite => labels.text(Text::BenchmarkFallback),
    };

    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, left),\n");
    out.push_str(&format!("  [{}], [{}],\n", labels.text(Text::Period), period));
    out.push_str(&format!(
        "  [{}], [{}],\n",
        labels.text(Text::Instruments),
        instruments
    ));
    out.push_str(&format!("  [{}], [{}],\n", labels.text(Text::Benchmark), benchmark));
    out.push_str(&format!(
        "  [{}], [{}],\n",
        labels.text(Text::MaWindow),
        input.ma_window
    ));
    out.push_str(")\n");
    out
}

pub fn render_metrics_table(performance: &PerformanceReport, labels: &ReportLabels) -> String {
    let mut out = String::from("#table(\n  columns: 4,\n  align: (left, right, right, right),\n");
    out.push_str(&header_row(labels, Text::Metric));

    let rows: [(Text, fn(&Metrics) -> String); 6] = [
        (Text::TotalReturn, |m| fmt_pct(m.total_return)),
        (Text::AnnualizedReturn, |m| fmt_pct(m.annualized_return)),
        (Text::MaxDrawdown, |m| fmt_pct(m.max_drawdown)),
        (Text::SharpeRatio, |m| fmt_ratio(m.sharpe_ratio)),
        (Text::CalmarRatio, |m| fmt_ratio(m.calmar_ratio)),
        (Text::TradingDays, |m| m.trading_days.to_string()),
    ];

    for (label, cell) in rows {
        out.push_str(&format!("  [{}],", labels.text(label)));
        for kind in SeriesKind::ALL {
            out.push_str(&format!(" [{}],", cell(performance.get(kind))));
        }
        out.push('\n');
    }

    out.push_str(")\n");
    out
}

pub fn render_probability_table(analysis: &AnalysisResult, labels: &ReportLabels) -> String {
    let config = &analysis.config;
    let mut out = String::from("#table(\n  columns: 4,\n  align: (left, right, right, right),\n");
    out.push_str(&header_row(labels, Text::Metric));

    out.push_str(&format!(
        "  [{} (≥ {}, {} m)],",
        labels.text(Text::TargetProbability),
        fmt_fraction(config.target_return),
        config.horizon_months
    ));
    for kind in SeriesKind::ALL {
        out.push_str(&format!(
            " [{}],",
            fmt_fraction(analysis.get(kind).target_probability)
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "  [{} ({} d)],",
        labels.text(Text::WinRate),
        config.holding_period
    ));
    for kind in SeriesKind::ALL {
        out.push_str(&format!(" [{}],", fmt_fraction(analysis.get(kind).win_rate)));
    }
    out.push('\n');

    out.push_str(")\n");
    out
}

/// Empty when nothing was skipped.
pub fn render_skipped(skipped: &[SkippedCode], labels: &ReportLabels) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut out = format!("*{}*\n\n", labels.text(Text::Skipped));
    for s in skipped {
        out.push_str(&format!(
            "- {}: {}\n",
            typst_escape(&labels.instrument(&s.code)),
            typst_escape(&s.reason.to_string())
        ));
    }
    out
}
