//! Named tuning values for the indicator, signal and performance stages.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FAST_WINDOW: usize = 30;
pub const DEFAULT_SLOW_WINDOW: usize = 60;
pub const DEFAULT_RSI_WINDOW: usize = 10;
pub const DEFAULT_VOLATILITY_WINDOW: usize = 20;
/// Number of consecutive strictly monotonic steps that mark a support/resistance point.
pub const DEFAULT_SUPPORT_RUN: usize = 5;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.02;
/// 0.5% breakout margin over the smoothed level.
pub const DEFAULT_BREAKOUT_MARGIN: f64 = 0.005;
pub const DEFAULT_HOLDING_DURATION: usize = 5;
pub const DEFAULT_SPREAD: f64 = 0.0;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub rsi_window: usize,
    pub volatility_window: usize,
    pub support_run: usize,
    pub stop_loss_pct: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            fast_window: DEFAULT_FAST_WINDOW,
            slow_window: DEFAULT_SLOW_WINDOW,
            rsi_window: DEFAULT_RSI_WINDOW,
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
            support_run: DEFAULT_SUPPORT_RUN,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
        }
    }
}

impl IndicatorParams {
    /// Longest look-back any indicator needs before it can produce a value.
    pub fn warmup(&self) -> usize {
        self.fast_window
            .max(self.slow_window)
            .max(self.rsi_window + 1)
            .max(self.support_run + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Fast/slow moving-average crossover.
    Crossover,
    /// Support/resistance breakout confirmed by trend and RSI.
    Breakout,
    /// Two-candle engulfing pattern.
    Engulfing,
}

impl StrategyKind {
    /// Event strategies mark single entry bars that are then held for
    /// `duration` bars; the crossover holds its position continuously.
    pub fn holds_for_duration(self) -> bool {
        matches!(self, StrategyKind::Breakout | StrategyKind::Engulfing)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Crossover => f.write_str("crossover"),
            StrategyKind::Breakout => f.write_str("breakout"),
            StrategyKind::Engulfing => f.write_str("engulfing"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crossover" | "sma" => Ok(StrategyKind::Crossover),
            "breakout" | "support_resistance" => Ok(StrategyKind::Breakout),
            "engulfing" | "candlestick" => Ok(StrategyKind::Engulfing),
            other => Err(format!(
                "unknown strategy '{other}' (expected crossover, breakout or engulfing)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub strategy: StrategyKind,
    pub breakout_margin: f64,
    /// Bars an event position is held for.
    pub duration: usize,
    /// Cost charged per event trade, in return units.
    pub spread: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Crossover,
            breakout_margin: DEFAULT_BREAKOUT_MARGIN,
            duration: DEFAULT_HOLDING_DURATION,
            spread: DEFAULT_SPREAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceParams {
    pub annualization: f64,
}

impl Default for PerformanceParams {
    fn default() -> Self {
        Self {
            annualization: TRADING_DAYS_PER_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineParams {
    pub indicators: IndicatorParams,
    pub signal: SignalParams,
    pub performance: PerformanceParams,
}
