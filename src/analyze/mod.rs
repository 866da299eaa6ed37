// Analyzer - from raw record text to a trend report.
//
// Pure functions throughout: no network, no filesystem. The pipeline is
// normalize -> count -> score -> report, with author clustering as an
// optional secondary analysis.

pub mod cluster;
pub mod keywords;
pub mod normalize;
pub mod report;
pub mod trends;

pub use report::{generate_report, AuthorSegment, MonthlyTrend, TrendReport};
pub use trends::{trending, TrendEntry};
