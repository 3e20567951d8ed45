//! Per-route aggregation and route ranking.
mod ranking;
mod summary;


pub use ranking::{Ranking, rank, score};
pub use summary::{RouteSummary, Statistics, summarize};
