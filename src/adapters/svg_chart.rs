//! SVG chart renderer.
//!
//! Draws a [`Chart`] as a standalone SVG file: dark background, horizontal
//! grid with value labels, start/middle/end time labels, one path per line
//! segment, triangle and cross markers and an optional area filled down to zero.

use crate::domain::chart::{Chart, ChartStyle, Line, MarkerShape};
use crate::domain::error::TrendscopeError;
use crate::ports::chart_port::ChartPort;
use chrono::{NaiveDateTime, NaiveTime};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MARKER_SIZE: f64 = 6.0;
const LEGEND_ROW: f64 = 16.0;

pub struct SvgChartAdapter {
    style: ChartStyle,
}

impl SvgChartAdapter {
    pub fn new() -> Self {
        Self {
            style: ChartStyle::default(),
        }
    }

    pub fn with_style(style: ChartStyle) -> Self {
        Self { style }
    }
}

impl Default for SvgChartAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartPort for SvgChartAdapter {
    fn render(
        &self,
        chart: &Chart,
        symbol: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, TrendscopeError> {
        let path = output_dir.join(format!("{}_{}.svg", chart.kind.file_stem(), symbol));
        let chart_err = |e: std::io::Error| TrendscopeError::Chart {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        fs::create_dir_all(output_dir).map_err(chart_err)?;
        fs::write(&path, render_svg(chart, &self.style)).map_err(chart_err)?;
        debug!(symbol, path = %path.display(), "chart written");
        Ok(path)
    }
}

/// Value range of the plot, padded when flat.
fn y_bounds(chart: &Chart) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in chart.y_values() {
        min = min.min(v);
        max = max.max(v);
    }
    if chart.area.is_some() {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if max - min < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    (min, max)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn time_label(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.date().to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Split a series into runs of defined values, keeping bar indices.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => current.push((i, *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

struct Frame {
    left: f64,
    top: f64,
    plot_width: f64,
    plot_height: f64,
    bars: usize,
    min: f64,
    range: f64,
}

impl Frame {
    fn x(&self, i: usize) -> f64 {
        self.left + (i as f64 / (self.bars.saturating_sub(1)).max(1) as f64) * self.plot_width
    }

    fn y(&self, v: f64) -> f64 {
        self.top + self.plot_height - ((v - self.min) / self.range) * self.plot_height
    }
}

fn line_path(frame: &Frame, segment: &[(usize, f64)]) -> String {
    let mut d = String::new();
    for (n, (i, v)) in segment.iter().enumerate() {
        let cmd = if n == 0 { "M" } else { " L" };
        let _ = write!(d, "{} {:.1} {:.1}", cmd, frame.x(*i), frame.y(*v));
    }
    d
}

fn line_color<'a>(line: &'a Line, style: &'a ChartStyle, next: &mut usize) -> &'a str {
    match &line.color {
        Some(c) => c.as_str(),
        None => {
            let c = style
                .palette
                .get(*next % style.palette.len().max(1))
                .map(String::as_str)
                .unwrap_or("white");
            *next += 1;
            c
        }
    }
}

pub fn render_svg(chart: &Chart, style: &ChartStyle) -> String {
    let (min, max) = y_bounds(chart);
    let frame = Frame {
        left: style.padding,
        top: style.padding,
        plot_width: style.width - 2.0 * style.padding,
        plot_height: style.height - 2.0 * style.padding,
        bars: chart.timestamps.len(),
        min,
        range: max - min,
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        w = style.width,
        h = style.height
    );
    let _ = writeln!(
        svg,
        "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        style.background
    );
    let _ = writeln!(
        svg,
        "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"16\" fill=\"{}\">{}</text>",
        style.width / 2.0,
        style.padding / 2.0,
        style.text,
        escape(&chart.title)
    );
    let _ = writeln!(
        svg,
        "  <text x=\"15\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" fill=\"{}\" transform=\"rotate(-90 15 {:.1})\">{}</text>",
        style.height / 2.0,
        style.axis_label,
        style.height / 2.0,
        escape(&chart.y_label)
    );

    let steps = style.grid_lines.max(1);
    for k in 0..=steps {
        let v = min + (max - min) * k as f64 / steps as f64;
        let y = frame.y(v);
        let _ = writeln!(
            svg,
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
            frame.left,
            y,
            frame.left + frame.plot_width,
            y,
            style.grid
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"{}\">{:.2}</text>",
            frame.left - 5.0,
            y + 3.0,
            style.text,
            v
        );
    }

    if let (Some(first), Some(last)) = (chart.timestamps.first(), chart.timestamps.last()) {
        let mid = chart.timestamps[chart.timestamps.len() / 2];
        let base = style.height - style.padding / 2.0;
        for (x, ts) in [
            (frame.left, *first),
            (frame.left + frame.plot_width / 2.0, mid),
            (frame.left + frame.plot_width, *last),
        ] {
            let _ = writeln!(
                svg,
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{}\">{}</text>",
                x,
                base,
                style.axis_label,
                time_label(ts)
            );
        }
    }

    if chart.is_empty() {
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\" fill=\"{}\">No data</text>",
            style.width / 2.0,
            style.height / 2.0,
            style.text
        );
    }

    let mut legend: Vec<(String, String)> = Vec::new();
    let mut next_color = 0;

    if let Some(area) = &chart.area {
        let color = line_color(area, style, &mut next_color).to_string();
        let zero = frame.y(0.0);
        for segment in segments(&area.values) {
            let (first, last) = (segment[0].0, segment[segment.len() - 1].0);
            let _ = writeln!(
                svg,
                "  <path d=\"M {:.1} {:.1} {} L {:.1} {:.1} Z\" fill=\"{}\" fill-opacity=\"{}\" stroke=\"none\"/>",
                frame.x(first),
                zero,
                line_path(&frame, &segment).replacen('M', "L", 1),
                frame.x(last),
                zero,
                color,
                area.opacity
            );
        }
        legend.push((area.label.clone(), color));
    }

    for line in &chart.lines {
        let color = line_color(line, style, &mut next_color).to_string();
        for segment in segments(&line.values) {
            let _ = writeln!(
                svg,
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"1.5\"/>",
                line_path(&frame, &segment),
                color,
                line.opacity
            );
        }
        legend.push((line.label.clone(), color));
    }

    for markers in &chart.markers {
        for (i, v) in &markers.points {
            let (x, y) = (frame.x(*i), frame.y(*v));
            let (tip, base) = match markers.shape {
                MarkerShape::Up => (y - MARKER_SIZE, y + MARKER_SIZE),
                MarkerShape::Down => (y + MARKER_SIZE, y - MARKER_SIZE),
                MarkerShape::Cross => {
                    let _ = writeln!(
                        svg,
                        "  <path d=\"M {:.1} {:.1} L {:.1} {:.1} M {:.1} {:.1} L {:.1} {:.1}\" stroke=\"{}\" stroke-width=\"2\"/>",
                        x - MARKER_SIZE,
                        y - MARKER_SIZE,
                        x + MARKER_SIZE,
                        y + MARKER_SIZE,
                        x - MARKER_SIZE,
                        y + MARKER_SIZE,
                        x + MARKER_SIZE,
                        y - MARKER_SIZE,
                        markers.color
                    );
                    continue;
                }
            };
            let _ = writeln!(
                svg,
                "  <polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" fill=\"{}\"/>",
                x,
                tip,
                x - MARKER_SIZE,
                base,
                x + MARKER_SIZE,
                base,
                markers.color
            );
        }
        legend.push((markers.label.clone(), markers.color.clone()));
    }

    for (row, (label, color)) in legend.iter().enumerate() {
        let y = style.padding + 10.0 + row as f64 * LEGEND_ROW;
        let x = style.padding + 10.0;
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"10\" height=\"10\" fill=\"{}\"/>",
            x,
            y - 9.0,
            color
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"{}\">{}</text>",
            x + 15.0,
            y,
            style.text,
            escape(label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::{
        compare_years_chart, drawdown_chart, signals_chart, view_sma_chart,
    };
    use crate::domain::indicator::compute_indicators;
    use crate::domain::indicator::test_support::series_from_closes;
    use crate::domain::params::IndicatorParams;
    use crate::domain::performance::{ReturnSeries, compute_drawdown};
    use crate::domain::signal::Signal;
    use tempfile::TempDir;

    fn params() -> IndicatorParams {
        IndicatorParams {
            fast_window: 2,
            slow_window: 3,
            ..IndicatorParams::default()
        }
    }

    #[test]
    fn segments_split_on_gaps() {
        let values = [None, Some(1.0), Some(2.0), None, Some(3.0)];
        let segs = segments(&values);
        assert_eq!(segs, vec![vec![(1, 1.0), (2, 2.0)], vec![(4, 3.0)]]);
        assert!(segments(&[None, None]).is_empty());
    }

    #[test]
    fn flat_values_get_padded_bounds() {
        let prices = series_from_closes(&[5.0, 5.0, 5.0]);
        let set = compute_indicators(&prices, &params()).unwrap();
        let (min, max) = y_bounds(&view_sma_chart(&prices, &set));
        assert_eq!((min, max), (4.0, 6.0));
    }

    #[test]
    fn area_bounds_include_zero() {
        let prices = series_from_closes(&[100.0, 90.0, 95.0]);
        let chart = drawdown_chart(&compute_drawdown(&ReturnSeries::buy_and_hold(&prices)));
        let (_, max) = y_bounds(&chart);
        assert_eq!(max, 0.0);
    }

    #[test]
    fn svg_contains_title_legend_and_paths() {
        let prices = series_from_closes(&[10.0, 11.0, 12.0, 11.5, 13.0]);
        let set = compute_indicators(&prices, &params()).unwrap();
        let svg = render_svg(&view_sma_chart(&prices, &set), &ChartStyle::default());

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("SMA Plot"));
        assert!(svg.contains("SMA Fast (2)"));
        assert!(svg.contains("#313233"));
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains("2024-01-01"));
    }

    #[test]
    fn markers_render_as_triangles() {
        let prices = series_from_closes(&[10.0, 11.0, 12.0]);
        let set = compute_indicators(&prices, &params()).unwrap();
        let positions = [None, Some(Signal::Long), Some(Signal::Short)];
        let chart = signals_chart(&prices, &set, &positions, None).unwrap();
        let svg = render_svg(&chart, &ChartStyle::default());

        assert_eq!(svg.matches("<polygon").count(), 2);
        assert!(svg.contains("Buy Signal"));
        assert!(svg.contains("Stop Loss Trigger"));
    }

    #[test]
    fn stop_loss_markers_render_as_crosses() {
        let prices = series_from_closes(&[100.0, 100.0, 90.0]);
        let set = compute_indicators(&prices, &params()).unwrap();
        let chart = signals_chart(&prices, &set, &[None; 3], None).unwrap();
        let svg = render_svg(&chart, &ChartStyle::default());

        assert_eq!(svg.matches("<polygon").count(), 0);
        assert_eq!(svg.matches("stroke-width=\"2\"").count(), 1);
    }

    #[test]
    fn comparison_chart_file_is_named_by_years() {
        let dir = TempDir::new().unwrap();
        let closes: Vec<f64> = (0..400).map(|i| 100.0 + i as f64).collect();
        let chart = compare_years_chart(&series_from_closes(&closes), 2024, 2025).unwrap();

        let path = SvgChartAdapter::new().render(&chart, "AAPL", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("compare_2024_vs_2025_AAPL.svg"));
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape("S&P <500>"), "S&amp;P &lt;500&gt;");
    }

    #[test]
    fn render_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("img");
        let prices = series_from_closes(&[100.0, 101.0, 99.0]);
        let chart = drawdown_chart(&compute_drawdown(&ReturnSeries::buy_and_hold(&prices)));

        let path = SvgChartAdapter::new().render(&chart, "AAPL", &out).unwrap();

        assert_eq!(path, out.join("drawdown_AAPL.svg"));
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("fill-opacity=\"0.65\""));
    }

    #[test]
    fn render_into_file_path_is_chart_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let prices = series_from_closes(&[100.0, 101.0]);
        let chart = drawdown_chart(&compute_drawdown(&ReturnSeries::buy_and_hold(&prices)));

        let err = SvgChartAdapter::new()
            .render(&chart, "AAPL", &blocker)
            .unwrap_err();
        assert!(matches!(err, TrendscopeError::Chart { .. }));
    }
}
