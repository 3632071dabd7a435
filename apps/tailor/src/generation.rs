//! Content Generation — tailored summary and bullet text for one posting.
//!
//! The pipeline core (scoring, substitution, validation) is deterministic
//! and never calls the LLM. Generation is a side output: a JSON sidecar of
//! suggested content the candidate can paste in by hand. When no API key is
//! configured, or every key is exhausted, a deterministic template fallback
//! keeps the run alive.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::{prompts, LlmClient, LlmError};
use crate::models::job::JobRequirement;
use crate::models::profile::CandidateProfile;

/// Tailored content blocks for one (profile, job) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlocks {
    pub summary: String,
    pub bullets: Vec<String>,
    pub skill_line: String,
    pub software_line: String,
    pub ats_notes: String,
}

/// The sidecar document written next to the tailored résumé.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContent {
    pub job_id: String,
    pub profile: String,
    pub generated_at: DateTime<Utc>,
    /// "llm" or "fallback", so a reviewer knows whether to trust the prose.
    pub backend: &'static str,
    pub blocks: ContentBlocks,
}

#[async_trait]
pub trait ContentGenerator {
    async fn generate(
        &mut self,
        profile: &CandidateProfile,
        job: &JobRequirement,
    ) -> Result<GeneratedContent, LlmError>;
}

/// LLM-backed generator. Falls back to the template when the model call
/// fails for any reason other than malformed local input.
pub struct LlmContentGenerator {
    client: LlmClient,
}

impl LlmContentGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(
        &mut self,
        profile: &CandidateProfile,
        job: &JobRequirement,
    ) -> Result<GeneratedContent, LlmError> {
        let prompt = prompts::content_prompt(profile, job);
        match self
            .client
            .call_json::<ContentBlocks>(&prompt, prompts::JSON_ONLY_SYSTEM)
            .await
        {
            Ok(blocks) => Ok(stamp(profile, job, "llm", blocks)),
            Err(e) => {
                warn!("LLM generation failed, using template fallback: {e}");
                Ok(stamp(profile, job, "fallback", fallback_content(profile, job)))
            }
        }
    }
}

/// Deterministic generator used with `--skip-generation` and in tests.
pub struct TemplateContentGenerator;

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn generate(
        &mut self,
        profile: &CandidateProfile,
        job: &JobRequirement,
    ) -> Result<GeneratedContent, LlmError> {
        Ok(stamp(profile, job, "fallback", fallback_content(profile, job)))
    }
}

fn stamp(
    profile: &CandidateProfile,
    job: &JobRequirement,
    backend: &'static str,
    blocks: ContentBlocks,
) -> GeneratedContent {
    GeneratedContent {
        job_id: job.job_id.clone(),
        profile: profile.name.clone(),
        generated_at: Utc::now(),
        backend,
        blocks,
    }
}

/// Template content built from requirement overlap alone. Lists posting
/// terms the candidate actually has first, then the candidate's remainder.
pub fn fallback_content(profile: &CandidateProfile, job: &JobRequirement) -> ContentBlocks {
    let skill_line = overlap_first(profile.skills.tokens(), &job.skills);
    let software_line = overlap_first(profile.software.tokens(), &job.software);

    let matched: Vec<&str> = job
        .skills
        .tokens()
        .iter()
        .filter(|t| profile.skills.contains(t))
        .map(String::as_str)
        .collect();

    let summary = format!(
        "Product professional applying for {} at {}. Hands-on with {}.",
        job.title_short,
        job.company,
        if matched.is_empty() {
            "cross-functional product delivery".to_string()
        } else {
            matched.join(", ")
        }
    );

    let bullets = matched
        .iter()
        .map(|skill| format!("Applied {skill} across the product lifecycle."))
        .collect();

    ContentBlocks {
        summary,
        bullets,
        skill_line,
        software_line,
        ats_notes: format!(
            "Posting keywords: {}.",
            job.skills.tokens().join(", ")
        ),
    }
}

fn overlap_first(candidate: &[String], required: &crate::matching::normalizer::RequirementSet) -> String {
    let mut ordered: Vec<&str> = candidate
        .iter()
        .filter(|t| required.contains(t))
        .map(String::as_str)
        .collect();
    ordered.extend(
        candidate
            .iter()
            .filter(|t| !required.contains(t.as_str()))
            .map(String::as_str),
    );
    ordered.join(", ")
}
