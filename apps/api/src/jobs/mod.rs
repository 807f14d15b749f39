// Job postings and applications.
// Implements: job creation and lookup, PDF resume upload on apply,
// candidate listing ranked by screening score.

pub mod handlers;
pub mod queries;
pub mod upload;
