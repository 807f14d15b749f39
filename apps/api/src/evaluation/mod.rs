// AI-assisted features built on the evaluation pipeline:
// resume scoring, job matching, cover letters, interview questions,
// bias audits, hiring analytics and resume Q&A.
// All LLM calls go through llm_client.

pub mod analytics;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod service;
