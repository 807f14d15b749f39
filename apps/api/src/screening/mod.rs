// Candidate screening for a job posting.
// Implements: pluggable scoring strategies (AI, keyword), the sequential
// batch screener, persistence of per-candidate results, HTTP handlers.

pub mod batch;
pub mod handlers;
pub mod keyword;
pub mod store;
pub mod strategy;
