// Scoring: threat classification and display verdicts for scan results.

pub mod threat;
pub mod verdict;
