//! Feature evaluators. Each one builds its prompt, runs it through the
//! completion pipeline and decodes the answer into its typed result.

use tracing::info;
use uuid::Uuid;

use crate::evaluation::models::{
    BiasAudit, CoverLetter, InterviewQuestionSet, JobContext, JobMatchResult, ResumeAnswer,
    ResumeEvaluation,
};
use crate::evaluation::prompts::*;
use crate::llm_client::fallback::complete_json_value;
use crate::llm_client::prompts::{PromptBuilder, JSON_ONLY_SYSTEM};
use crate::llm_client::{CompletionProvider, EvaluationRequest, LlmError};
use crate::models::job::JobRow;

pub const MAX_INTERVIEW_QUESTIONS: usize = 20;
pub const DEFAULT_INTERVIEW_QUESTIONS: usize = 8;

fn json_system(base: &str) -> String {
    format!("{base}\n\n{JSON_ONLY_SYSTEM}")
}

/// Adds the job header, description and requirements sections.
fn with_job(builder: PromptBuilder, job: &JobContext) -> PromptBuilder {
    builder
        .section("JOB", &job.headline(), 60)
        .section("JOB DESCRIPTION", &job.description, JOB_DESCRIPTION_TOKENS)
        .section("REQUIREMENTS", &job.requirements_line(), 300)
}

/// Scores a resume, against a job when one is given.
pub async fn evaluate_resume(
    provider: &dyn CompletionProvider,
    job: Option<&JobContext>,
    resume_text: &str,
) -> Result<ResumeEvaluation, LlmError> {
    let builder = PromptBuilder::new(json_system(RECRUITER_SYSTEM));
    let builder = match job {
        Some(job) => with_job(builder.instructions(RESUME_SCORE_INSTRUCTIONS), job),
        None => builder.instructions(GENERAL_RESUME_INSTRUCTIONS),
    };
    let messages = builder.section("RESUME", resume_text, RESUME_TOKENS).build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.2)
        .max_output_tokens(1200);
    let value = complete_json_value(provider, request).await?;
    Ok(ResumeEvaluation::from_value(&value))
}

/// Ranks `jobs` for one resume. No call is made when there are no jobs.
pub async fn match_jobs(
    provider: &dyn CompletionProvider,
    resume_text: &str,
    jobs: &[JobRow],
) -> Result<JobMatchResult, LlmError> {
    if jobs.is_empty() {
        return Ok(JobMatchResult { matches: vec![] });
    }

    let job_lines: Vec<String> = jobs
        .iter()
        .map(|j| {
            format!(
                "[{}] {} at {} | skills: {} | {}",
                j.id,
                j.title,
                j.company,
                j.required_skills.join(", "),
                j.description.split_whitespace().collect::<Vec<_>>().join(" ")
            )
        })
        .collect();

    let messages = PromptBuilder::new(json_system(CAREER_ADVISOR_SYSTEM))
        .instructions(JOB_MATCH_INSTRUCTIONS)
        .section("RESUME", resume_text, RESUME_TOKENS)
        .list_section("OPEN JOBS", &job_lines, JOB_SUMMARY_TOKENS)
        .build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.2)
        .max_output_tokens(1500);
    let value = complete_json_value(provider, request).await?;
    let result = JobMatchResult::from_value(&value, jobs);
    info!(
        "Job match returned {} of {} jobs",
        result.matches.len(),
        jobs.len()
    );
    Ok(result)
}

/// Free-text cover letter; no structured output is requested.
pub async fn write_cover_letter(
    provider: &dyn CompletionProvider,
    job_id: Uuid,
    job: &JobContext,
    resume_text: &str,
    tone: Option<&str>,
) -> Result<CoverLetter, LlmError> {
    let tone = tone
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_COVER_LETTER_TONE);

    let builder = PromptBuilder::new(COVER_LETTER_SYSTEM)
        .instructions(format!("{COVER_LETTER_INSTRUCTIONS} Tone: {tone}."));
    let messages = with_job(builder, job)
        .section("RESUME", resume_text, RESUME_TOKENS)
        .build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.7)
        .max_output_tokens(900)
        .plain_text();
    let completion = provider.complete(&request).await?;

    Ok(CoverLetter {
        job_id,
        letter: completion.text.trim().to_string(),
    })
}

pub async fn generate_interview_questions(
    provider: &dyn CompletionProvider,
    job: &JobContext,
    resume_text: Option<&str>,
    count: usize,
) -> Result<InterviewQuestionSet, LlmError> {
    let count = count.clamp(1, MAX_INTERVIEW_QUESTIONS);

    let builder = PromptBuilder::new(json_system(INTERVIEWER_SYSTEM))
        .instructions(INTERVIEW_QUESTIONS_INSTRUCTIONS.replace("{count}", &count.to_string()));
    let messages = with_job(builder, job)
        .section("CANDIDATE RESUME", resume_text.unwrap_or_default(), RESUME_TOKENS)
        .build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.6)
        .max_output_tokens(1500);
    let value = complete_json_value(provider, request).await?;
    Ok(InterviewQuestionSet::from_value(&value, count))
}

pub async fn audit_bias(
    provider: &dyn CompletionProvider,
    text: &str,
) -> Result<BiasAudit, LlmError> {
    let messages = PromptBuilder::new(json_system(BIAS_AUDITOR_SYSTEM))
        .instructions(BIAS_CHECK_INSTRUCTIONS)
        .section("TEXT", text, FREE_TEXT_TOKENS)
        .build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.2)
        .max_output_tokens(2000);
    let value = complete_json_value(provider, request).await?;
    Ok(BiasAudit::from_value(&value))
}

/// Answers a free-form question about one resume.
pub async fn answer_resume_question(
    provider: &dyn CompletionProvider,
    resume_text: &str,
    question: &str,
) -> Result<ResumeAnswer, LlmError> {
    let messages = PromptBuilder::new(RESUME_QA_SYSTEM)
        .section("RESUME", resume_text, RESUME_TOKENS)
        .section("QUESTION", question, 250)
        .build();

    let request = EvaluationRequest::new(messages, provider.default_model())
        .temperature(0.2)
        .max_output_tokens(600)
        .plain_text();
    let completion = provider.complete(&request).await?;

    Ok(ResumeAnswer {
        answer: completion.text.trim().to_string(),
    })
}
