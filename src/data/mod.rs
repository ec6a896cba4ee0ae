//! Match record parsing and chronological preparation.

pub mod ingest;

pub use ingest::{filter_recent_seasons, parse_matches, season_end_year};
