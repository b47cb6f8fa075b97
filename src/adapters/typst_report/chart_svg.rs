//! SVG chart rendering for reports.
//!
//! Every chart shares one frame: a fixed canvas, left/bottom axes, three
//! y-axis labels (max, mid, min) and three date labels (first, middle, last).
//! Generators return an empty string when there is nothing to draw.

use chrono::NaiveDate;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 300.0;
const SMALL_CHART_HEIGHT: f64 = 120.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const SPAN_FILL: &str = "#fde68a";

/// One line of a multi-line chart. `None` values break the line.
pub struct LineSeries<'a> {
    pub label: &'a str,
    pub values: &'a [Option<f64>],
    pub color: &'static str,
}

struct Frame {
    height: f64,
    points: usize,
    min: f64,
    max: f64,
}

impl Frame {
    fn new(height: f64, points: usize, min: f64, max: f64) -> Self {
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        Self {
            height,
            points,
            min,
            max,
        }
    }

    fn plot_width(&self) -> f64 {
        CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, i: usize) -> f64 {
        MARGIN_LEFT + (i as f64 / (self.points.saturating_sub(1)).max(1) as f64) * self.plot_width()
    }

    fn y(&self, v: f64) -> f64 {
        MARGIN_TOP + self.plot_height() - ((v - self.min) / (self.max - self.min)) * self.plot_height()
    }

    fn open(&self, title: &str, dates: &[NaiveDate], y_fmt: fn(f64) -> String) -> String {
        let mut svg = format!(
            r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"##,
            w = CHART_WIDTH,
            h = self.height
        );
        svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"15\" text-anchor=\"start\" font-size=\"12\" fill=\"#333\">{}</text>\n",
            MARGIN_LEFT,
            xml_escape(title)
        ));
        let bottom = self.height - MARGIN_BOTTOM;
        svg.push_str(&format!(
            "  <line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = bottom
        ));
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{b}\" x2=\"{}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT,
            CHART_WIDTH - MARGIN_RIGHT,
            b = bottom
        ));

        for (value, y) in [
            (self.max, MARGIN_TOP + 5.0),
            ((self.max + self.min) / 2.0, MARGIN_TOP + self.plot_height() / 2.0),
            (self.min, bottom - 5.0),
        ] {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
                MARGIN_LEFT - 5.0,
                y,
                y_fmt(value)
            ));
        }

        if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
            let mid = dates[dates.len() / 2];
            for (date, x) in [
                (first, MARGIN_LEFT),
                (&mid, MARGIN_LEFT + self.plot_width() / 2.0),
                (last, CHART_WIDTH - MARGIN_RIGHT),
            ] {
                svg.push_str(&format!(
                    "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
                    x,
                    self.height - MARGIN_BOTTOM / 2.0,
                    date
                ));
            }
        }
        svg
    }

    fn line_path(&self, values: &[Option<f64>]) -> String {
        let mut path = String::new();
        let mut pen_down = false;
        for (i, v) in values.iter().enumerate() {
            match v {
                Some(v) if v.is_finite() => {
                    let cmd = if pen_down { " L" } else { " M" };
                    path.push_str(&format!("{} {:.1} {:.1}", cmd, self.x(i), self.y(*v)));
                    pen_down = true;
                }
                _ => pen_down = false,
            }
        }
        path.trim_start().to_string()
    }

    fn span_rects(&self, spans: &[(usize, usize)]) -> String {
        let half_step = if self.points > 1 {
            self.plot_width() / (self.points - 1) as f64 / 2.0
        } else {
            self.plot_width() / 2.0
        };
        let left_edge = MARGIN_LEFT;
        let right_edge = CHART_WIDTH - MARGIN_RIGHT;

        spans
            .iter()
            .map(|&(start, end)| {
                let x0 = (self.x(start) - half_step).max(left_edge);
                let x1 = (self.x(end) + half_step).min(right_edge);
                format!(
                    "  <rect x=\"{:.1}\" y=\"{}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.5\"/>\n",
                    x0,
                    MARGIN_TOP,
                    (x1 - x0).max(0.0),
                    self.plot_height(),
                    SPAN_FILL
                )
            })
            .collect()
    }

    fn legend(&self, series: &[LineSeries<'_>]) -> String {
        let mut out = String::new();
        let mut x = CHART_WIDTH - MARGIN_RIGHT;
        for s in series.iter().rev() {
            let label_width = 7.0 * s.label.chars().count() as f64 + 20.0;
            x -= label_width;
            out.push_str(&format!(
                "  <line x1=\"{:.1}\" y1=\"11\" x2=\"{:.1}\" y2=\"11\" stroke=\"{}\" stroke-width=\"2\"/>\n",
                x,
                x + 12.0,
                s.color
            ));
            out.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"15\" font-size=\"10\" fill=\"#333\">{}</text>\n",
                x + 15.0,
                xml_escape(s.label)
            ));
        }
        out
    }
}

fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Contiguous runs of held rows as inclusive `(start, end)` index pairs.
pub fn holding_spans(held: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &h) in held.iter().enumerate() {
        match (h != 0, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, held.len() - 1));
    }
    spans
}

fn fmt_nav(v: f64) -> String {
    format!("{:.2}", v)
}

fn fmt_pct_axis(v: f64) -> String {
    format!("{:.1}%", v)
}

fn fmt_price(v: f64) -> String {
    format!("{:.2}", v)
}

/// Multi-line chart of NAV series sharing one calendar.
pub fn nav_comparison_svg(title: &str, dates: &[NaiveDate], series: &[LineSeries<'_>]) -> String {
    let Some((min, max)) = value_range(series.iter().flat_map(|s| s.values.iter().flatten()))
    else {
        return String::new();
    };
    if dates.is_empty() {
        return String::new();
    }

    let frame = Frame::new(CHART_HEIGHT, dates.len(), min, max);
    let mut svg = frame.open(title, dates, fmt_nav);
    svg.push_str(&frame.legend(series));
    for s in series {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            frame.line_path(s.values),
            s.color
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Filled drawdown area; `drawdown` is in percent and never positive.
pub fn drawdown_svg(title: &str, dates: &[NaiveDate], drawdown: &[f64]) -> String {
    if dates.len() < 2 || drawdown.len() != dates.len() {
        return String::new();
    }
    let min = value_range(drawdown.iter()).map(|(lo, _)| lo).unwrap_or(0.0).min(-0.01);

    let frame = Frame::new(CHART_HEIGHT, dates.len(), min, 0.0);
    let mut svg = frame.open(title, dates, fmt_pct_axis);

    let mut path = format!("M {:.1} {:.1}", frame.x(0), frame.y(0.0));
    for (i, &dd) in drawdown.iter().enumerate() {
        let dd = if dd.is_finite() { dd } else { 0.0 };
        path.push_str(&format!(" L {:.1} {:.1}", frame.x(i), frame.y(dd)));
    }
    path.push_str(&format!(
        " L {:.1} {:.1} Z",
        frame.x(drawdown.len() - 1),
        frame.y(0.0)
    ));

    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"#dc2626\" fill-opacity=\"0.3\" stroke=\"#dc2626\" stroke-width=\"1\"/>\n",
        path
    ));
    svg.push_str("</svg>");
    svg
}

/// Step chart of a 0/1 holding state.
pub fn holdings_svg(title: &str, dates: &[NaiveDate], held: &[u8]) -> String {
    if dates.is_empty() || held.len() != dates.len() {
        return String::new();
    }

    let frame = Frame::new(SMALL_CHART_HEIGHT, dates.len(), 0.0, 1.0);
    let mut svg = frame.open(title, dates, |v| format!("{:.0}", v));

    let level = |h: u8| if h != 0 { 1.0 } else { 0.0 };
    let mut path = format!("M {:.1} {:.1}", frame.x(0), frame.y(level(held[0])));
    for i in 1..held.len() {
        path.push_str(&format!(
            " L {:.1} {:.1} L {:.1} {:.1}",
            frame.x(i),
            frame.y(level(held[i - 1])),
            frame.x(i),
            frame.y(level(held[i]))
        ));
    }

    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"#16a34a\" stroke-width=\"1.5\"/>\n",
        path
    ));
    svg.push_str("</svg>");
    svg
}

/// Close price against its moving average, with held spans shaded.
pub fn close_ma_svg(
    title: &str,
    dates: &[NaiveDate],
    close: &LineSeries<'_>,
    moving_average: &LineSeries<'_>,
    held: &[u8],
) -> String {
    let Some((min, max)) = value_range(
        close
            .values
            .iter()
            .chain(moving_average.values.iter())
            .flatten(),
    ) else {
        return String::new();
    };
    if dates.is_empty() {
        return String::new();
    }

    let frame = Frame::new(CHART_HEIGHT, dates.len(), min, max);
    let mut svg = frame.open(title, dates, fmt_price);
    svg.push_str(&frame.span_rects(&holding_spans(held)));
    for s in [close, moving_average] {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            frame.line_path(s.values),
            s.color
        ));
    }
    svg.push_str(&frame.legend(&[
        LineSeries {
            label: close.label,
            values: &[],
            color: close.color,
        },
        LineSeries {
            label: moving_average.label,
            values: &[],
            color: moving_average.color,
        },
    ]));
    svg.push_str("</svg>");
    svg
}

/// Wrap an SVG document for inline embedding in Typst markup.
pub fn embed(svg: &str, fallback: &str) -> String {
    if svg.is_empty() {
        return format!("_{}_", fallback);
    }
    format!(
        "#image.decode(\n\"{}\",\n  width: 100%,\n)",
        svg.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
