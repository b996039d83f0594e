//! Chart descriptions handed to the chart port.
//!
//! Builders here only decide what to draw; styling lives in [`ChartStyle`] and
//! is passed to the renderer explicitly.

use crate::domain::indicator::levels::stop_loss_triggers;
use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::performance::{DrawdownSeries, ReturnSeries};
use crate::domain::signal::Signal;
use chrono::{Datelike, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    ViewSma,
    SignalsSma,
    ProfitsSma,
    Drawdown,
    SupportResistance,
    CompareYears(i32, i32),
    /// Two years, one calendar month.
    CompareMonth(i32, i32, u32),
}

impl PlotKind {
    pub fn file_stem(self) -> String {
        match self {
            PlotKind::ViewSma => "view_plot_sma".to_string(),
            PlotKind::SignalsSma => "verify_signals_sma".to_string(),
            PlotKind::ProfitsSma => "profits_sma".to_string(),
            PlotKind::Drawdown => "drawdown".to_string(),
            PlotKind::SupportResistance => "support_resistance".to_string(),
            PlotKind::CompareYears(a, b) => format!("compare_{a}_vs_{b}"),
            PlotKind::CompareMonth(a, b, m) => format!("compare_{a}_{b}_{m:02}"),
        }
    }
}

/// Optional chart selection from the `[output]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartOptions {
    /// Limit the signals chart to one calendar year.
    pub signals_year: Option<i32>,
    pub compare_years: Option<(i32, i32)>,
    /// Also compare this month across `compare_years`.
    pub compare_month: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Up,
    Down,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: String,
    pub values: Vec<Option<f64>>,
    /// Explicit colour; `None` takes the next palette entry.
    pub color: Option<String>,
    pub opacity: f64,
}

impl Line {
    fn new(label: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.to_string(),
            values,
            color: None,
            opacity: 1.0,
        }
    }

    fn colored(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    fn faded(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Markers {
    pub label: String,
    /// (bar index, y value)
    pub points: Vec<(usize, f64)>,
    pub shape: MarkerShape,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: PlotKind,
    pub title: String,
    pub y_label: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub lines: Vec<Line>,
    pub markers: Vec<Markers>,
    /// Filled between the series and zero.
    pub area: Option<Line>,
}

impl Chart {
    fn new(kind: PlotKind, title: &str, y_label: &str, timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            y_label: y_label.to_string(),
            timestamps,
            lines: Vec::new(),
            markers: Vec::new(),
            area: None,
        }
    }

    /// Every plotted y value, for axis scaling.
    pub fn y_values(&self) -> impl Iterator<Item = f64> + '_ {
        let lines = self
            .lines
            .iter()
            .chain(self.area.iter())
            .flat_map(|l| l.values.iter().flatten().copied());
        let markers = self
            .markers
            .iter()
            .flat_map(|m| m.points.iter().map(|(_, y)| *y));
        lines.chain(markers)
    }

    pub fn is_empty(&self) -> bool {
        self.y_values().next().is_none()
    }
}

/// Rendering options passed at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub background: String,
    pub grid: String,
    pub text: String,
    pub axis_label: String,
    pub palette: Vec<String>,
    pub grid_lines: usize,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 600.0,
            padding: 60.0,
            background: "#313233".into(),
            grid: "#474A4A".into(),
            text: "#C9C9C9".into(),
            axis_label: "gray".into(),
            palette: ["#669FEE", "#66EE91", "#9988DD", "#EECC55", "#88BB44", "#FFBBBB"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            grid_lines: 5,
        }
    }
}

pub fn view_sma_chart(prices: &PriceSeries, set: &IndicatorSet) -> Chart {
    let mut chart = Chart::new(PlotKind::ViewSma, "SMA Plot", "Price", prices.timestamps());
    chart.lines = vec![
        Line::new("Close Price", prices.closes().into_iter().map(Some).collect()),
        sma_line(set, set.params.fast_window, "SMA Fast"),
        sma_line(set, set.params.slow_window, "SMA Slow"),
    ];
    chart
}

fn sma_line(set: &IndicatorSet, window: usize, label: &str) -> Line {
    let values = set
        .get(&IndicatorType::Sma(window))
        .map(|s| s.raw())
        .unwrap_or_else(|| vec![None; set.len()]);
    Line::new(&format!("{label} ({window})"), values)
}

/// Buy/sell and stop-loss markers over price and averages, optionally
/// limited to one year.
///
/// Returns `None` when the requested year has no bars.
pub fn signals_chart(
    prices: &PriceSeries,
    set: &IndicatorSet,
    positions: &[Option<Signal>],
    year: Option<i32>,
) -> Option<Chart> {
    let keep: Vec<usize> = prices
        .bars()
        .iter()
        .enumerate()
        .filter(|(_, b)| year.is_none_or(|y| b.timestamp.year() == y))
        .map(|(i, _)| i)
        .collect();
    if keep.is_empty() {
        return None;
    }

    let title = match year {
        Some(y) => format!("SMA Signals Verification ({y})"),
        None => "SMA Signals Verification".to_string(),
    };
    let timestamps = keep.iter().map(|&i| prices.bars()[i].timestamp).collect();
    let mut chart = Chart::new(PlotKind::SignalsSma, &title, "Price", timestamps);

    let pick = |values: Vec<Option<f64>>| keep.iter().map(|&i| values[i]).collect::<Vec<_>>();
    let closes: Vec<Option<f64>> = prices.closes().into_iter().map(Some).collect();
    let fast = sma_line(set, set.params.fast_window, "SMA Fast");
    let slow = sma_line(set, set.params.slow_window, "SMA Slow");

    chart.lines = vec![
        Line::new("Close Price", pick(closes)).faded(0.35),
        Line::new(&fast.label, pick(fast.values)).faded(0.35),
        Line::new(&slow.label, pick(slow.values)).faded(0.35),
    ];

    let marks = |wanted: Signal| -> Vec<(usize, f64)> {
        keep.iter()
            .enumerate()
            .filter(|(_, i)| positions.get(**i).copied().flatten() == Some(wanted))
            .map(|(x, i)| (x, prices.bars()[*i].close))
            .collect()
    };
    chart.markers = vec![
        Markers {
            label: "Buy Signal".into(),
            points: marks(Signal::Long),
            shape: MarkerShape::Up,
            color: "#57CE95".into(),
        },
        Markers {
            label: "Sell Signal".into(),
            points: marks(Signal::Short),
            shape: MarkerShape::Down,
            color: "red".into(),
        },
    ];

    if let Some(stop) = set.get(&IndicatorType::StopLoss) {
        let triggered = stop_loss_triggers(prices, stop);
        chart.markers.push(Markers {
            label: "Stop Loss Trigger".into(),
            points: keep
                .iter()
                .enumerate()
                .filter(|(_, i)| triggered[**i])
                .map(|(x, i)| (x, prices.bars()[*i].close))
                .collect(),
            shape: MarkerShape::Cross,
            color: "#C9C9C9".into(),
        });
    }
    Some(chart)
}

pub fn profits_chart(returns: &ReturnSeries, cumulative: &[f64]) -> Chart {
    let mut chart = Chart::new(
        PlotKind::ProfitsSma,
        "Strategy Profits",
        "Cumulative Return (%)",
        returns.timestamps.clone(),
    );
    chart.lines = vec![Line::new(
        "Cumulative Returns",
        cumulative.iter().map(|c| Some(c * 100.0)).collect(),
    )];
    chart
}

pub fn drawdown_chart(drawdown: &DrawdownSeries) -> Chart {
    let mut chart = Chart::new(
        PlotKind::Drawdown,
        "Drawdown",
        "Drawdown (%)",
        drawdown.timestamps.clone(),
    );
    chart.area = Some(
        Line::new(
            "Drawdown",
            drawdown.values.iter().map(|d| Some(d * 100.0)).collect(),
        )
        .colored("#CE5757")
        .faded(0.65),
    );
    chart
}

pub fn support_resistance_chart(prices: &PriceSeries, set: &IndicatorSet) -> Chart {
    let mut chart = Chart::new(
        PlotKind::SupportResistance,
        "Support and Resistance Levels",
        "Price",
        prices.timestamps(),
    );
    let column = |t: IndicatorType| {
        set.get(&t)
            .map(|s| s.raw())
            .unwrap_or_else(|| vec![None; set.len()])
    };
    chart.lines = vec![
        Line::new("Support", column(IndicatorType::SmoothedSupport)).colored("green"),
        Line::new("Resistance", column(IndicatorType::SmoothedResistance)).colored("red"),
        Line::new("Close Price", prices.closes().into_iter().map(Some).collect())
            .colored("#669FEE"),
    ];
    chart
}

/// Close prices of two calendar years on one time axis.
///
/// Returns `None` when neither year has bars.
pub fn compare_years_chart(prices: &PriceSeries, first: i32, second: i32) -> Option<Chart> {
    comparison(
        prices,
        PlotKind::CompareYears(first, second),
        format!("Comparison of Close Prices: {first} vs {second}"),
        (format!("Close Price {first}"), |t: &NaiveDateTime| t.year() == first),
        (format!("Close Price {second}"), |t: &NaiveDateTime| t.year() == second),
    )
}

/// Close prices of the same month in two years.
pub fn compare_month_chart(
    prices: &PriceSeries,
    first: i32,
    second: i32,
    month: u32,
) -> Option<Chart> {
    comparison(
        prices,
        PlotKind::CompareMonth(first, second, month),
        format!("Comparison of Close Prices: {first}-{month:02} vs {second}-{month:02}"),
        (format!("Close Price {first}-{month:02}"), |t: &NaiveDateTime| {
            t.year() == first && t.month() == month
        }),
        (format!("Close Price {second}-{month:02}"), |t: &NaiveDateTime| {
            t.year() == second && t.month() == month
        }),
    )
}

/// One close-price line per period; each line is undefined outside its period.
fn comparison(
    prices: &PriceSeries,
    kind: PlotKind,
    title: String,
    first: (String, impl Fn(&NaiveDateTime) -> bool),
    second: (String, impl Fn(&NaiveDateTime) -> bool),
) -> Option<Chart> {
    let (first_label, in_first) = first;
    let (second_label, in_second) = second;
    let kept: Vec<_> = prices
        .bars()
        .iter()
        .filter(|b| in_first(&b.timestamp) || in_second(&b.timestamp))
        .collect();
    if kept.is_empty() {
        return None;
    }

    let timestamps = kept.iter().map(|b| b.timestamp).collect();
    let mut chart = Chart::new(kind, &title, "Price", timestamps);
    let line = |in_period: &dyn Fn(&NaiveDateTime) -> bool| -> Vec<Option<f64>> {
        kept.iter()
            .map(|b| in_period(&b.timestamp).then_some(b.close))
            .collect()
    };
    chart.lines = vec![
        Line::new(&first_label, line(&in_first)).colored("blue").faded(0.7),
        Line::new(&second_label, line(&in_second)).colored("orange").faded(0.7),
    ];
    Some(chart)
}
