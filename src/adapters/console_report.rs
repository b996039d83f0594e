//! Plain-text metrics report and chart output directory handling.

use crate::domain::error::TrendscopeError;
use crate::domain::pipeline::SymbolReport;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Why a metric has no value, without the metric name prefix.
fn undefined(err: &TrendscopeError) -> String {
    match err {
        TrendscopeError::DegenerateStatistic { reason, .. } => format!("undefined ({reason})"),
        other => format!("undefined ({other})"),
    }
}

pub fn format_ratio(value: &Result<f64, TrendscopeError>) -> String {
    match value {
        Ok(v) => format!("{:.3}", v),
        Err(e) => undefined(e),
    }
}

pub fn format_percent(value: &Result<f64, TrendscopeError>) -> String {
    match value {
        Ok(v) => format!("{:.1} %", v),
        Err(e) => undefined(e),
    }
}

/// Per-symbol summary printed after each analysis.
pub fn format_report(report: &SymbolReport) -> String {
    let perf = &report.performance;
    let first = report.prices.bars().first().map(|b| b.timestamp.date());
    let last = report.prices.bars().last().map(|b| b.timestamp.date());
    let span = match (first, last) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "no bars".to_string(),
    };
    let signals = report.positions.iter().filter(|p| p.is_some()).count();

    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", report.symbol));
    out.push_str(&format!("Bars:          {} ({})\n", report.prices.len(), span));
    out.push_str(&format!("Signals:       {} defined\n", signals));
    out.push_str(&format!("Total return:  {:.1} %\n", perf.total_return));
    out.push_str(&format!("Max drawdown:  {:.1} %\n", perf.max_drawdown));
    out.push_str(&format!("Sortino:       {}\n", format_ratio(&perf.sortino)));
    out.push_str(&format!("Beta:          {}\n", format_ratio(&perf.beta)));
    out.push_str(&format!("Alpha:         {}\n", format_percent(&perf.alpha)));
    out
}

/// Create `dir` if missing; with `clear`, remove `.svg` files left by earlier runs.
///
/// Returns the number of files removed.
pub fn prepare_output_dir(dir: &Path, clear: bool) -> Result<usize, TrendscopeError> {
    fs::create_dir_all(dir)?;
    if !clear {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "svg") {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    debug!(dir = %dir.display(), removed, "cleared previous charts");
    Ok(removed)
}
