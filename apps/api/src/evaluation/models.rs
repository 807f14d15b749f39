//! Typed evaluation results.
//!
//! Models are asked for a JSON shape but nothing forces them to follow it, so
//! every result is decoded from a raw `serde_json::Value` with safe defaults:
//! missing lists become empty, scores are clamped to 0–100 and unknown
//! recommendation labels are derived from the score. Both camelCase and
//! snake_case keys are accepted.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::job::JobRow;

// ────────────────────────────────────────────────────────────────────────────
// Tagged union returned by the AI endpoints
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluation {
    ResumeScore(ResumeEvaluation),
    JobMatch(JobMatchResult),
    BiasAudit(BiasAudit),
    InterviewQuestions(InterviewQuestionSet),
    CoverLetter(CoverLetter),
    Analytics(HiringInsights),
    ResumeAnswer(ResumeAnswer),
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    PotentialMatch,
    Reject,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "STRONG_MATCH",
            Recommendation::GoodMatch => "GOOD_MATCH",
            Recommendation::PotentialMatch => "POTENTIAL_MATCH",
            Recommendation::Reject => "REJECT",
        }
    }

    /// Lenient label parsing: case, spaces and dashes are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        match normalized.as_str() {
            "STRONG_MATCH" | "STRONG" | "HIGHLY_RECOMMENDED" => Some(Recommendation::StrongMatch),
            "GOOD_MATCH" | "GOOD" | "RECOMMENDED" | "SHORTLIST" => Some(Recommendation::GoodMatch),
            "POTENTIAL_MATCH" | "PARTIAL_MATCH" | "POTENTIAL" | "MAYBE" | "CONSIDER" => {
                Some(Recommendation::PotentialMatch)
            }
            "REJECT" | "REJECTED" | "NO_MATCH" | "POOR_MATCH" | "NOT_RECOMMENDED" => {
                Some(Recommendation::Reject)
            }
            _ => None,
        }
    }

    pub fn from_score(score: u32) -> Self {
        if score >= 85 {
            Recommendation::StrongMatch
        } else if score >= 70 {
            Recommendation::GoodMatch
        } else if score >= 50 {
            Recommendation::PotentialMatch
        } else {
            Recommendation::Reject
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt input
// ────────────────────────────────────────────────────────────────────────────

/// Job details placed in evaluation prompts. Callers may override the
/// stored description and skills for a single run.
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    pub title: String,
    pub company: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub min_experience: Option<i32>,
}

impl JobContext {
    pub fn from_job(job: &JobRow) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            description: job.description.clone(),
            required_skills: job.required_skills.clone(),
            min_experience: job.min_experience,
        }
    }

    pub fn with_overrides(
        mut self,
        description: Option<String>,
        required_skills: Option<Vec<String>>,
        min_experience: Option<i32>,
    ) -> Self {
        if let Some(d) = description.filter(|d| !d.trim().is_empty()) {
            self.description = d;
        }
        if let Some(s) = required_skills.filter(|s| !s.is_empty()) {
            self.required_skills = s;
        }
        if min_experience.is_some() {
            self.min_experience = min_experience;
        }
        self
    }

    /// One-line header: `Title at Company`.
    pub fn headline(&self) -> String {
        match (self.title.trim(), self.company.trim()) {
            ("", "") => "Unspecified role".to_string(),
            (t, "") => t.to_string(),
            ("", c) => format!("Role at {c}"),
            (t, c) => format!("{t} at {c}"),
        }
    }

    pub fn requirements_line(&self) -> String {
        let mut parts = Vec::new();
        if !self.required_skills.is_empty() {
            parts.push(format!("Required skills: {}", self.required_skills.join(", ")));
        }
        if let Some(years) = self.min_experience {
            parts.push(format!("Minimum experience: {years} years"));
        }
        parts.join("\n")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume evaluation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeEvaluation {
    pub overall_score: u32,
    pub recommendation: Recommendation,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: Option<String>,
}

impl ResumeEvaluation {
    pub fn from_value(v: &Value) -> Self {
        let overall_score = score_field(v, &["overallScore", "overall_score", "score"]).unwrap_or(0);
        let recommendation = string_field(v, &["recommendation", "verdict"])
            .and_then(|l| Recommendation::from_label(&l))
            .unwrap_or_else(|| Recommendation::from_score(overall_score));

        Self {
            overall_score,
            recommendation,
            strengths: string_list(v, &["strengths"]),
            concerns: string_list(v, &["concerns", "weaknesses", "gaps"]),
            missing_skills: string_list(v, &["missingSkills", "missing_skills"]),
            summary: string_field(v, &["summary", "feedback"]),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job match
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub job_id: Uuid,
    pub title: String,
    pub score: u32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMatchResult {
    pub matches: Vec<JobMatch>,
}

impl JobMatchResult {
    /// Keeps only matches that name a job from `jobs`, best score first.
    pub fn from_value(v: &Value, jobs: &[JobRow]) -> Self {
        let mut matches: Vec<JobMatch> = array_field(v, &["matches", "jobs"])
            .iter()
            .filter_map(|m| {
                let id = string_field(m, &["jobId", "job_id", "id"])?;
                let job = jobs.iter().find(|j| j.id.to_string() == id.trim())?;
                Some(JobMatch {
                    job_id: job.id,
                    title: job.title.clone(),
                    score: score_field(m, &["score", "matchScore", "match_score"]).unwrap_or(0),
                    reasons: string_list(m, &["reasons", "reasoning"]),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score));
        let mut seen = HashSet::new();
        matches.retain(|m| seen.insert(m.job_id));
        Self { matches }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bias audit
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasIssue {
    pub phrase: String,
    pub category: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasAudit {
    /// 0 = neutral wording, 100 = heavily biased.
    pub bias_score: u32,
    pub issues: Vec<BiasIssue>,
    pub inclusive_rewrite: Option<String>,
}

impl BiasAudit {
    pub fn from_value(v: &Value) -> Self {
        let issues = array_field(v, &["issues", "flaggedPhrases", "flagged_phrases"])
            .iter()
            .filter_map(|i| {
                Some(BiasIssue {
                    phrase: string_field(i, &["phrase", "text"])?,
                    category: string_field(i, &["category", "type"])
                        .unwrap_or_else(|| "general".to_string()),
                    suggestion: string_field(i, &["suggestion", "alternative"]).unwrap_or_default(),
                })
            })
            .collect();

        Self {
            bias_score: score_field(v, &["biasScore", "bias_score", "score"]).unwrap_or(0),
            issues,
            inclusive_rewrite: string_field(v, &["inclusiveRewrite", "inclusive_rewrite", "rewrite"]),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interview questions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub category: String,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewQuestionSet {
    pub questions: Vec<InterviewQuestion>,
}

impl InterviewQuestionSet {
    /// Accepts questions as objects or bare strings; keeps at most `limit`.
    pub fn from_value(v: &Value, limit: usize) -> Self {
        let questions = array_field(v, &["questions"])
            .iter()
            .filter_map(|q| match q {
                Value::String(s) if !s.trim().is_empty() => Some(InterviewQuestion {
                    question: s.trim().to_string(),
                    category: "general".to_string(),
                    rationale: None,
                }),
                Value::Object(_) => Some(InterviewQuestion {
                    question: string_field(q, &["question", "text"])?,
                    category: string_field(q, &["category", "type"])
                        .unwrap_or_else(|| "general".to_string()),
                    rationale: string_field(q, &["rationale", "purpose", "why"]),
                }),
                _ => None,
            })
            .take(limit)
            .collect();
        Self { questions }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter, analytics, Q&A
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetter {
    pub job_id: Uuid,
    pub letter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBuckets {
    pub below_50: u32,
    pub from_50_to_69: u32,
    pub from_70_to_84: u32,
    pub from_85: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub total_candidates: u32,
    pub with_resume: u32,
    pub screened: u32,
    pub shortlisted: u32,
    pub average_score: Option<f64>,
    pub score_buckets: ScoreBuckets,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiringInsights {
    pub job_id: Uuid,
    pub stats: PipelineStats,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeAnswer {
    pub answer: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field access
// ────────────────────────────────────────────────────────────────────────────

/// First of `keys` holding a non-null value.
fn first<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| v.get(*k).filter(|found| !found.is_null()))
}

/// Reads a 0–100 score from a number or a numeric string such as `"82"`,
/// `"75.5"` or `"90%"`.
pub fn score_field(v: &Value, keys: &[&str]) -> Option<u32> {
    let raw = match first(v, keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u32)
}

pub fn string_field(v: &Value, keys: &[&str]) -> Option<String> {
    first(v, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// A list of strings; a lone string is treated as a one-item list and
/// non-string items are dropped.
pub fn string_list(v: &Value, keys: &[&str]) -> Vec<String> {
    match first(v, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn array_field<'a>(v: &'a Value, keys: &[&str]) -> &'a [Value] {
    first(v, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn job(title: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: "Acme".to_string(),
            description: "Build things".to_string(),
            required_skills: vec!["rust".to_string()],
            min_experience: Some(3),
            location: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resume_evaluation_full_payload() {
        let eval = ResumeEvaluation::from_value(&json!({
            "overallScore": 82,
            "recommendation": "GOOD_MATCH",
            "strengths": ["Rust", "  Postgres  ", ""],
            "concerns": ["No Kubernetes"],
            "missingSkills": ["kubernetes"],
            "summary": "Solid backend engineer."
        }));
        assert_eq!(eval.overall_score, 82);
        assert_eq!(eval.recommendation, Recommendation::GoodMatch);
        assert_eq!(eval.strengths, vec!["Rust", "Postgres"]);
        assert_eq!(eval.missing_skills, vec!["kubernetes"]);
        assert_eq!(eval.summary.as_deref(), Some("Solid backend engineer."));
    }

    #[test]
    fn test_resume_evaluation_defaults_for_empty_object() {
        let eval = ResumeEvaluation::from_value(&json!({}));
        assert_eq!(eval.overall_score, 0);
        assert_eq!(eval.recommendation, Recommendation::Reject);
        assert!(eval.strengths.is_empty());
        assert!(eval.summary.is_none());
    }

    #[test]
    fn test_resume_evaluation_string_score_and_unknown_label() {
        let eval = ResumeEvaluation::from_value(&json!({
            "score": "91.6%",
            "recommendation": "absolutely hire",
            "concerns": "Short tenure"
        }));
        assert_eq!(eval.overall_score, 92);
        assert_eq!(eval.recommendation, Recommendation::StrongMatch);
        assert_eq!(eval.concerns, vec!["Short tenure"]);
    }

    #[test]
    fn test_scores_are_clamped() {
        assert_eq!(score_field(&json!({"score": 250}), &["score"]), Some(100));
        assert_eq!(score_field(&json!({"score": -4}), &["score"]), Some(0));
        assert_eq!(score_field(&json!({"score": true}), &["score"]), None);
        assert_eq!(score_field(&json!({"score": null}), &["score"]), None);
    }

    #[test]
    fn test_recommendation_labels_are_lenient() {
        assert_eq!(
            Recommendation::from_label("good match"),
            Some(Recommendation::GoodMatch)
        );
        assert_eq!(
            Recommendation::from_label("Strong-Match"),
            Some(Recommendation::StrongMatch)
        );
        assert_eq!(Recommendation::from_label("??"), None);
    }

    #[test]
    fn test_recommendation_from_score_bands() {
        assert_eq!(Recommendation::from_score(85), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_score(70), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(50), Recommendation::PotentialMatch);
        assert_eq!(Recommendation::from_score(49), Recommendation::Reject);
    }

    #[test]
    fn test_job_match_drops_unknown_ids_and_sorts() {
        let jobs = vec![job("Backend"), job("Frontend")];
        let result = JobMatchResult::from_value(
            &json!({"matches": [
                {"jobId": jobs[1].id.to_string(), "score": 40, "reasons": ["some React"]},
                {"jobId": Uuid::new_v4().to_string(), "score": 99},
                {"jobId": jobs[0].id.to_string(), "score": "88"}
            ]}),
            &jobs,
        );
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].title, "Backend");
        assert_eq!(result.matches[0].score, 88);
        assert_eq!(result.matches[1].reasons, vec!["some React"]);
    }

    #[test]
    fn test_bias_audit_skips_issues_without_phrase() {
        let audit = BiasAudit::from_value(&json!({
            "biasScore": 35,
            "issues": [
                {"phrase": "rockstar", "category": "gender", "suggestion": "skilled engineer"},
                {"category": "age"}
            ],
            "inclusiveRewrite": "We are hiring a skilled engineer."
        }));
        assert_eq!(audit.bias_score, 35);
        assert_eq!(audit.issues.len(), 1);
        assert_eq!(audit.issues[0].phrase, "rockstar");
    }

    #[test]
    fn test_interview_questions_mixed_shapes_and_limit() {
        let set = InterviewQuestionSet::from_value(
            &json!({"questions": [
                "Tell me about a hard bug.",
                {"question": "Explain ownership in Rust.", "category": "technical", "rationale": "core skill"},
                {"category": "behavioral"},
                42,
                "Why this role?"
            ]}),
            2,
        );
        assert_eq!(set.questions.len(), 2);
        assert_eq!(set.questions[0].category, "general");
        assert_eq!(set.questions[1].category, "technical");
    }

    #[test]
    fn test_bare_array_yields_no_questions() {
        let set = InterviewQuestionSet::from_value(&json!(["Q1", "Q2"]), 10);
        assert!(set.questions.is_empty());
    }

    #[test]
    fn test_null_key_falls_through_to_alias() {
        let eval = ResumeEvaluation::from_value(&json!({"overallScore": null, "score": 75}));
        assert_eq!(eval.overall_score, 75);
        assert_eq!(eval.recommendation, Recommendation::GoodMatch);
    }

    #[test]
    fn test_evaluation_serializes_with_kind_tag() {
        let value = serde_json::to_value(Evaluation::ResumeAnswer(ResumeAnswer {
            answer: "Yes".to_string(),
        }))
        .unwrap();
        assert_eq!(value, json!({"kind": "resume_answer", "answer": "Yes"}));
    }

    #[test]
    fn test_job_context_overrides() {
        let ctx = JobContext::from_job(&job("Backend")).with_overrides(
            Some("Custom description".to_string()),
            Some(vec![]),
            Some(5),
        );
        assert_eq!(ctx.description, "Custom description");
        assert_eq!(ctx.required_skills, vec!["rust"]);
        assert_eq!(ctx.min_experience, Some(5));
        assert_eq!(ctx.headline(), "Backend at Acme");
        assert_eq!(
            ctx.requirements_line(),
            "Required skills: rust\nMinimum experience: 5 years"
        );
    }
}
