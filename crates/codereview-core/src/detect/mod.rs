//! Heuristic issue detection over analysed source units.

pub mod heuristics;
pub mod rules;

pub use rules::PatternDetector;
