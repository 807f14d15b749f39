//! Hiring analytics: pipeline statistics computed from candidate rows, plus
//! AI commentary on them. The numbers never come from the model.

use uuid::Uuid;

use crate::evaluation::models::{
    string_list, HiringInsights, JobContext, PipelineStats, ScoreBuckets,
};
use crate::evaluation::prompts::{ANALYST_SYSTEM, ANALYTICS_INSTRUCTIONS};
use crate::llm_client::fallback::complete_json_value;
use crate::llm_client::prompts::{PromptBuilder, JSON_ONLY_SYSTEM};
use crate::llm_client::{CompletionProvider, EvaluationRequest, LlmError};
use crate::models::candidate::CandidateRow;

pub fn compute_pipeline_stats(candidates: &[CandidateRow]) -> PipelineStats {
    let mut stats = PipelineStats {
        total_candidates: candidates.len() as u32,
        ..PipelineStats::default()
    };
    let mut buckets = ScoreBuckets::default();
    let mut score_sum = 0_i64;

    for candidate in candidates {
        if candidate.resume_file.is_some() {
            stats.with_resume += 1;
        }
        if candidate.shortlisted {
            stats.shortlisted += 1;
        }
        if candidate.screened_at.is_none() {
            continue;
        }
        stats.screened += 1;

        let score = candidate.ai_score.unwrap_or(0).clamp(0, 100);
        score_sum += i64::from(score);
        match score {
            s if s >= 85 => buckets.from_85 += 1,
            s if s >= 70 => buckets.from_70_to_84 += 1,
            s if s >= 50 => buckets.from_50_to_69 += 1,
            _ => buckets.below_50 += 1,
        }
    }

    if stats.screened > 0 {
        let avg = score_sum as f64 / f64::from(stats.screened);
        stats.average_score = Some((avg * 10.0).round() / 10.0);
    }
    stats.score_buckets = buckets;
    stats
}

fn stats_lines(stats: &PipelineStats) -> Vec<String> {
    let b = &stats.score_buckets;
    vec![
        format!("Total applicants: {}", stats.total_candidates),
        format!("Applicants with a resume: {}", stats.with_resume),
        format!("Screened: {}", stats.screened),
        format!("Shortlisted: {}", stats.shortlisted),
        format!(
            "Average screening score: {}",
            stats
                .average_score
                .map(|a| format!("{a:.1}"))
                .unwrap_or_else(|| "n/a".to_string())
        ),
        format!(
            "Score distribution: <50: {}, 50-69: {}, 70-84: {}, 85+: {}",
            b.below_50, b.from_50_to_69, b.from_70_to_84, b.from_85
        ),
    ]
}

pub async fn hiring_insights(
    provider: &dyn CompletionProvider,
    job_id: Uuid,
    job: &JobContext,
    stats: PipelineStats,
) -> Result<HiringInsights, LlmError> {
    let messages = PromptBuilder::new(format!("{ANALYST_SYSTEM}\n\n{JSON_ONLY_SYSTEM}"))
        .instructions(ANALYTICS_INSTRUCTIONS)
        .section("JOB", &job.headline(), 60)
        .section("REQUIREMENTS", &job.requirements_line(), 300)
        .list_section("PIPELINE STATISTICS", &stats_lines(&stats), 60)
        .build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.4)
        .max_output_tokens(800);
    let value = complete_json_value(provider, request).await?;

    Ok(HiringInsights {
        job_id,
        stats,
        insights: string_list(&value, &["insights"]),
        recommendations: string_list(&value, &["recommendations"]),
    })
}
