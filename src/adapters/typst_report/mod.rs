//! Typst report generation.
//!
//! Orchestrates placeholder resolution: reads a Typst template (either the
//! built-in default or a custom file via `template_path`), resolves all
//! `{{PLACEHOLDER}}` markers by calling helpers from `chart_svg` and `tables`,
//! and writes the final `.typ` file.

pub mod chart_svg;
pub mod default_template;
pub mod labels;
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::backtest::SeriesKind;
use crate::domain::error::MeanrevError;
use crate::domain::nav::NavPoint;
use crate::ports::report_port::{ReportInput, ReportPort};

use chart_svg::LineSeries;
use labels::{ReportLabels, Text};

const SERIES_COLORS: [&str; 3] = ["#2563eb", "#6b7280", "#dc2626"];
const CLOSE_COLOR: &str = "#111827";
const MA_COLOR: &str = "#f97316";

pub struct TypstReportAdapter {
    template_path: Option<PathBuf>,
    labels: ReportLabels,
}

impl TypstReportAdapter {
    pub fn new(template_path: Option<PathBuf>, labels: ReportLabels) -> Self {
        Self {
            template_path,
            labels,
        }
    }

    fn load_template(&self) -> Result<String, MeanrevError> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path).map_err(|e| MeanrevError::Report {
                reason: format!("failed to read template {}: {}", path.display(), e),
            }),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(&self, input: &ReportInput<'_>, output_path: &Path) -> Result<(), MeanrevError> {
        let template = self.load_template()?;
        let content = resolve(&template, input, &self.labels);
        fs::write(output_path, content).map_err(|e| MeanrevError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })?;
        info!(path = %output_path.display(), "report written");
        Ok(())
    }
}

fn as_column(nav: &[NavPoint]) -> Vec<Option<f64>> {
    nav.iter().map(|p| Some(p.nav)).collect()
}

fn render_nav_chart(input: &ReportInput<'_>, labels: &ReportLabels) -> String {
    let result = input.result;
    let columns: Vec<Vec<Option<f64>>> = SeriesKind::ALL
        .iter()
        .map(|&kind| as_column(result.nav(kind)))
        .collect();
    let series: Vec<LineSeries<'_>> = SeriesKind::ALL
        .iter()
        .zip(&columns)
        .zip(SERIES_COLORS)
        .map(|((&kind, values), color)| LineSeries {
            label: labels.series(kind),
            values,
            color,
        })
        .collect();

    let svg = chart_svg::nav_comparison_svg(labels.text(Text::NavChart), result.calendar(), &series);
    chart_svg::embed(&svg, labels.text(Text::NoData))
}

fn render_drawdown_charts(input: &ReportInput<'_>, labels: &ReportLabels) -> String {
    let calendar = input.result.calendar();
    SeriesKind::ALL
        .iter()
        .map(|&kind| {
            let drawdown = input.result.drawdown(kind);
            let title = format!("{}: {}", labels.text(Text::DrawdownChart), labels.series(kind));
            chart_svg::embed(
                &chart_svg::drawdown_svg(&title, calendar, &drawdown),
                labels.text(Text::NoData),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_instrument_sections(input: &ReportInput<'_>, labels: &ReportLabels) -> String {
    let result = input.result;
    let calendar = result.calendar();
    let ma_label = format!("{}{}", labels.text(Text::MovingAverage), input.ma_window);

    let mut out = String::new();
    for (i, code) in result.universe.codes.iter().enumerate() {
        let name = labels.instrument(code);
        let held = result.positions.column(i);

        out.push_str(&format!("=== {}\n\n", tables::typst_escape(&name)));

        let close = LineSeries {
            label: labels.text(Text::Close),
            values: &result.universe.close[i],
            color: CLOSE_COLOR,
        };
        let ma = LineSeries {
            label: &ma_label,
            values: &result.signals[i].rolling_mean,
            color: MA_COLOR,
        };
        let svg = chart_svg::close_ma_svg(&name, calendar, &close, &ma, &held);
        out.push_str(&chart_svg::embed(&svg, labels.text(Text::NoData)));
        out.push_str("\n\n");

        let title = format!("{}: {}", labels.text(Text::Holdings), name);
        let svg = chart_svg::holdings_svg(&title, calendar, &held);
        out.push_str(&chart_svg::embed(&svg, labels.text(Text::NoData)));
        out.push_str("\n\n");
    }

    if out.is_empty() {
        format!("_{}_", labels.text(Text::NoData))
    } else {
        out
    }
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup ready to be written to a `.typ` file.
pub fn resolve(template: &str, input: &ReportInput<'_>, labels: &ReportLabels) -> String {
    let mut output = template.to_string();

    let headings = [
        ("{{TITLE}}", Text::Title),
        ("{{H_PERFORMANCE}}", Text::Performance),
        ("{{H_HOLDING_OUTCOMES}}", Text::HoldingOutcomes),
        ("{{H_NAV}}", Text::NavChart),
        ("{{H_DRAWDOWN}}", Text::DrawdownChart),
        ("{{H_INSTRUMENTS}}", Text::Instruments),
    ];
    for (placeholder, text) in headings {
        output = output.replace(placeholder, labels.text(text));
    }

    // Sections render only when their placeholder is present.
    let sections: [(&str, fn(&ReportInput<'_>, &ReportLabels) -> String); 8] = [
        ("{{RUN_SUMMARY}}", tables::render_run_summary),
        ("{{METRICS_TABLE}}", |i, l| tables::render_metrics_table(i.performance, l)),
        ("{{PROBABILITY_TABLE}}", |i, l| tables::render_probability_table(i.analysis, l)),
        ("{{SKIPPED_CODES}}", |i, l| tables::render_skipped(i.skipped, l)),
        ("{{NAV_CHART}}", render_nav_chart),
        ("{{DRAWDOWN_CHARTS}}", render_drawdown_charts),
        ("{{INSTRUMENT_SECTIONS}}", render_instrument_sections),
        ("{{GENERATED_WITH}}", |_, _| {
            format!("meanrev {}", env!("CARGO_PKG_VERSION"))
        }),
    ];
    for (placeholder, render) in sections {
        if output.contains(placeholder) {
            output = output.replace(placeholder, &render(input, labels));
        }
    }

    output
}
