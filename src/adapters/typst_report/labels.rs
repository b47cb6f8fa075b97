//! Display labels for report captions.
//!
//! Instrument display names come from the `[labels]` config section and are
//! only ever used for layout.

use std::collections::HashMap;

use crate::domain::backtest::SeriesKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Unknown values fall back to English.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("zh") => Language::Zh,
            _ => Language::En,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    Title,
    RunSummary,
    Period,
    Instruments,
    Benchmark,
    BenchmarkFallback,
    MaWindow,
    Performance,
    Metric,
    TotalReturn,
    AnnualizedReturn,
    MaxDrawdown,
    SharpeRatio,
    CalmarRatio,
    TradingDays,
    HoldingOutcomes,
    TargetProbability,
    WinRate,
    NavChart,
    DrawdownChart,
    Holdings,
    Close,
    MovingAverage,
    Skipped,
    NoData,
}

#[derive(Debug, Clone, Default)]
pub struct ReportLabels {
    pub language: Language,
    names: HashMap<String, String>,
}

impl ReportLabels {
    pub fn new(language: Language, names: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            language,
            names: names
                .into_iter()
                .map(|(code, name)| (code.to_uppercase(), name))
                .collect(),
        }
    }

    /// `Name (code)` when a display name is configured, else the code.
    pub fn instrument(&self, code: &str) -> String {
        match self.names.get(&code.to_uppercase()) {
            Some(name) => format!("{} ({})", name, code),
            None => code.to_string(),
        }
    }

    pub fn series(&self, kind: SeriesKind) -> &'static str {
        match (self.language, kind) {
            (Language::En, SeriesKind::Strategy) => "Strategy",
            (Language::En, SeriesKind::Composite) => "Composite Index",
            (Language::En, SeriesKind::Benchmark) => "Benchmark",
            (Language::Zh, SeriesKind::Strategy) => "策略",
            (Language::Zh, SeriesKind::Composite) => "综合指数",
            (Language::Zh, SeriesKind::Benchmark) => "基准指数",
        }
    }

    pub fn text(&self, key: Text) -> &'static str {
        match self.language {
            Language::En => english(key),
            Language::Zh => chinese(key),
        }
    }
}

fn english(key: Text) -> &'static str {
    match key {
        Text::Title => "Mean-Reversion Backtest Report",
        Text::RunSummary => "Run Summary",
        Text::Period => "Period",
        Text::Instruments => "Instruments",
        Text::Benchmark => "Benchmark",
        Text::BenchmarkFallback => "composite index (no external benchmark)",
        Text::MaWindow => "Moving-average window",
        Text::Performance => "Performance",
        Text::Metric => "Metric",
        Text::TotalReturn => "Total Return",
        Text::AnnualizedReturn => "Annualized Return",
        Text::MaxDrawdown => "Max Drawdown",
        Text::SharpeRatio => "Sharpe Ratio",
        Text::CalmarRatio => "Calmar Ratio",
        Text::TradingDays => "Trading Days",
        Text::HoldingOutcomes => "Holding Outcomes",
        Text::TargetProbability => "Target probability",
        Text::WinRate => "Win rate",
        Text::NavChart => "Net Asset Value",
        Text::DrawdownChart => "Drawdown",
        Text::Holdings => "Holdings",
        Text::Close => "Close",
        Text::MovingAverage => "MA",
        Text::Skipped => "Skipped codes",
        Text::NoData => "No data.",
    }
}

fn chinese(key: Text) -> &'static str {
    match key {
        Text::Title => "均值回归回测报告",
        Text::RunSummary => "运行概要",
        Text::Period => "区间",
        Text::Instruments => "标的",
        Text::Benchmark => "基准",
        Text::BenchmarkFallback => "综合指数（无外部基准）",
        Text::MaWindow => "均线窗口",
        Text::Performance => "绩效",
        Text::Metric => "指标",
        Text::TotalReturn => "总收益率",
        Text::AnnualizedReturn => "年化收益率",
        Text::MaxDrawdown => "最大回撤",
        Text::SharpeRatio => "夏普比率",
        Text::CalmarRatio => "卡玛比率",
        Text::TradingDays => "交易日数",
        Text::HoldingOutcomes => "持有结果",
        Text::TargetProbability => "目标达成概率",
        Text::WinRate => "胜率",
        Text::NavChart => "净值走势",
        Text::DrawdownChart => "回撤",
        Text::Holdings => "持仓状态",
        Text::Close => "收盘价",
        Text::MovingAverage => "均线",
        Text::Skipped => "跳过的标的",
        Text::NoData => "无数据。",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parse() {
        assert_eq!(Language::parse(Some("zh")), Language::Zh);
        assert_eq!(Language::parse(Some(" ZH ")), Language::Zh);
        assert_eq!(Language::parse(Some("en")), Language::En);
        assert_eq!(Language::parse(None), Language::En);
    }

    #[test]
    fn instrument_names() {
        let labels = ReportLabels::new(
            Language::En,
            vec![("600519".to_string(), "Kweichow Moutai".to_string())],
        );
        assert_eq!(labels.instrument("600519"), "Kweichow Moutai (600519)");
        assert_eq!(labels.instrument("600036"), "600036");
    }

    #[test]
    fn captions_follow_language() {
        let en = ReportLabels::default();
        let zh = ReportLabels::new(Language::Zh, Vec::new());
        assert_eq!(en.text(Text::MaxDrawdown), "Max Drawdown");
        assert_eq!(zh.text(Text::MaxDrawdown), "最大回撤");
        assert_eq!(zh.series(SeriesKind::Strategy), "策略");
    }
}
