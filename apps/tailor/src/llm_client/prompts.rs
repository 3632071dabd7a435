// Shared prompt constants and prompt-building utilities.
// The generation module builds its request prompts from these fragments.

use crate::models::job::JobRequirement;
use crate::models::profile::CandidateProfile;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps generated content grounded in the candidate's
/// actual capabilities.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Every claim must be supported by the candidate skills and \
    software listed in the context. Do NOT invent tools, certifications, \
    employers, or dates. If the posting asks for something the candidate \
    does not have, omit it rather than fabricate it.";

/// Builds the user prompt for tailored content generation.
pub fn content_prompt(profile: &CandidateProfile, job: &JobRequirement) -> String {
    format!(
        "Tailor resume content for this job posting.\n\n\
         POSTING\n\
         title: {title}\n\
         company: {company}\n\
         required skills: {skills}\n\
         required software: {software}\n\n\
         CANDIDATE\n\
         skills: {candidate_skills}\n\
         software: {candidate_software}\n\n\
         Return a JSON object with exactly these fields:\n\
         {{\n\
           \"summary\": \"2-3 sentence professional summary\",\n\
           \"bullets\": [\"achievement bullet\", ...],\n\
           \"skill_line\": \"comma-separated skills, posting terms first\",\n\
           \"software_line\": \"comma-separated tools, posting terms first\",\n\
           \"ats_notes\": \"keywords worth emphasizing for this posting\"\n\
         }}\n\n\
         {grounding}",
        title = job.title,
        company = job.company,
        skills = job.skills.tokens().join(", "),
        software = job.software.tokens().join(", "),
        candidate_skills = profile.skills.tokens().join(", "),
        candidate_software = profile.software.tokens().join(", "),
        grounding = GROUNDING_INSTRUCTION,
    )
}
