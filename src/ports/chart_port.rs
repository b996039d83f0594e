//! Chart rendering port.

use crate::domain::chart::Chart;
use crate::domain::error::TrendscopeError;
use std::path::{Path, PathBuf};

pub trait ChartPort {
    /// Render `chart` for `symbol` into `output_dir`, returning the written path.
    ///
    /// Files follow the `{plot_kind}_{symbol}.{ext}` naming convention.
    fn render(
        &self,
        chart: &Chart,
        symbol: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, TrendscopeError>;
}
