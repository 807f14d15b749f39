//! Deterministic keyword screening. No LLM call, no external dependencies
//! beyond the regex for experience mentions.
//!
//! Score = 2 points per requested skill found in the resume text
//! (case-insensitive substring) + a one-time 2 point bonus when the text
//! mentions a number of years ("5 years", "3+ yrs").

use std::collections::HashSet;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::AppError;
use crate::evaluation::models::Recommendation;
use crate::screening::strategy::{ScreeningOutcome, ScreeningStrategy};

pub const POINTS_PER_SKILL: u32 = 2;
pub const EXPERIENCE_BONUS: u32 = 2;

const EXPERIENCE_PATTERN: &str = r"(?i)\b\d{1,2}\s*\+?\s*(?:years?|yrs?)\b";

pub struct KeywordScreening {
    skills: Vec<String>,
    min_score: u32,
    experience: Regex,
}

impl KeywordScreening {
    /// `skills` are lowercased, trimmed and deduplicated; blanks are dropped.
    pub fn new(skills: &[String], min_score: u32) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        let skills = skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();

        let experience = Regex::new(EXPERIENCE_PATTERN)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid experience pattern: {e}")))?;

        Ok(Self {
            skills,
            min_score,
            experience,
        })
    }

    /// Half of the attainable skill points, rounded up. Used when the caller
    /// gives no `minScore`.
    pub fn default_min_score(skill_count: usize) -> u32 {
        (skill_count as u32 * POINTS_PER_SKILL).div_ceil(2)
    }

    pub fn with_min_score(mut self, min_score: u32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    fn score(&self, resume_text: &str) -> ScreeningOutcome {
        let text = resume_text.to_lowercase();
        let (matched, missing): (Vec<&String>, Vec<&String>) =
            self.skills.iter().partition(|skill| text.contains(skill.as_str()));

        let mut score = matched.len() as u32 * POINTS_PER_SKILL;
        if self.experience.is_match(resume_text) {
            score += EXPERIENCE_BONUS;
        }

        let shortlisted = score >= self.min_score;
        ScreeningOutcome {
            score,
            recommendation: if shortlisted {
                Recommendation::GoodMatch
            } else {
                Recommendation::Reject
            },
            strengths: matched.iter().map(|s| s.to_string()).collect(),
            concerns: missing.iter().map(|s| format!("Missing skill: {s}")).collect(),
            shortlisted,
        }
    }
}

#[async_trait]
impl ScreeningStrategy for KeywordScreening {
    fn backend(&self) -> &'static str {
        "keyword"
    }

    async fn evaluate(&self, resume_text: &str) -> Result<ScreeningOutcome, AppError> {
        Ok(self.score(resume_text))
    }
}
