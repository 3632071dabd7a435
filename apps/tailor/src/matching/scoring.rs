//! Matching & Scoring Engine — measures a candidate profile against a
//! normalized job posting.
//!
//! Pure and deterministic: the same (profile, job, weights) triple always
//! produces the same result. The score is a fixed weighted sum of
//! per-category coverage ratios — a simple, auditable linear model with no
//! hidden nonlinearity, so the number is explainable to the end user.

use serde::{Deserialize, Serialize};

use crate::matching::normalizer::RequirementSet;
use crate::models::job::JobRequirement;
use crate::models::profile::CandidateProfile;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

/// Per-category weights. Must sum to 1.0; skills outrank software, software
/// outranks degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub skills: f64,
    pub software: f64,
    pub degrees: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights {
            skills: 0.5,
            software: 0.3,
            degrees: 0.2,
        }
    }
}

impl CategoryWeights {
    /// True when the weights sum to 1.0 within tolerance.
    pub fn is_normalized(&self) -> bool {
        (self.skills + self.software + self.degrees - 1.0).abs() <= 1e-6
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result models
// ────────────────────────────────────────────────────────────────────────────

/// Coverage of one requirement category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCoverage {
    /// |job ∩ profile| / |job|; 1.0 when the job states no requirements in
    /// this category (a job with no stated requirements cannot be
    /// under-matched).
    pub coverage: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Derived match report. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub fit_score: f64,
    /// Job tokens absent from the profile, ordered by category weight
    /// descending, then by first-seen order within the job record.
    pub gap_list: Vec<String>,
    pub skills: CategoryCoverage,
    pub software: CategoryCoverage,
    pub degrees: CategoryCoverage,
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Scores a profile against a job. Never fails: an empty profile produces a
/// zero score and a gap list equal to the full job requirement set.
pub fn score(
    profile: &CandidateProfile,
    job: &JobRequirement,
    weights: &CategoryWeights,
) -> MatchResult {
    let skills = category_coverage(&job.skills, &profile.skills);
    let software = category_coverage(&job.software, &profile.software);
    let degrees = category_coverage(&job.degrees, &profile.degrees);

    let fit_score = (weights.skills * skills.coverage
        + weights.software * software.coverage
        + weights.degrees * degrees.coverage)
        .clamp(0.0, 1.0);

    // Categories ordered by weight descending; sort is stable, so equal
    // weights keep the skills > software > degrees convention.
    let mut categories = [
        (weights.skills, &skills),
        (weights.software, &software),
        (weights.degrees, &degrees),
    ];
    categories.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let gap_list = categories
        .iter()
        .flat_map(|(_, cov)| cov.missing.iter().cloned())
        .collect();

    MatchResult {
        fit_score,
        gap_list,
        skills,
        software,
        degrees,
    }
}

fn category_coverage(required: &RequirementSet, held: &RequirementSet) -> CategoryCoverage {
    if required.is_empty() {
        return CategoryCoverage {
            coverage: 1.0,
            matched: Vec::new(),
            missing: Vec::new(),
        };
    }

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for token in required.tokens() {
        if held.contains(token) {
            matched.push(token.clone());
        } else {
            missing.push(token.clone());
        }
    }

    CategoryCoverage {
        coverage: matched.len() as f64 / required.len() as f64,
        matched,
        missing,
    }
}

/// Seniority-distance signal in [0.3, 1.0], or None when either side is
/// unknown. Logged for context; deliberately not folded into fit_score.
pub fn seniority_alignment(profile: &CandidateProfile, job: &JobRequirement) -> Option<f64> {
    use crate::models::job::Seniority;

    let job_rank = job.seniority.rank()?;
    let profile_rank = Seniority::normalize(profile.seniority.as_deref()?).rank()?;

    Some(match job_rank.abs_diff(profile_rank) {
        0 => 1.0,
        1 => 0.8,
        2 => 0.6,
        _ => 0.3,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::Seniority;

    fn make_job(skills: &str, software: &str, degrees: &str) -> JobRequirement {
        JobRequirement {
            job_id: "J-100".to_string(),
            title: "Product Manager".to_string(),
            title_short: "PM".to_string(),
            company: "Acme".to_string(),
            country: "US".to_string(),
            state: None,
            city: None,
            schedule_type: None,
            experience_years: None,
            seniority: Seniority::Senior,
            skills: RequirementSet::parse(Some(skills)),
            software: RequirementSet::parse(Some(software)),
            degrees: RequirementSet::parse(Some(degrees)),
        }
    }

    fn make_profile(skills: &str, software: &str) -> CandidateProfile {
        CandidateProfile {
            name: "product_management".to_string(),
            skills: RequirementSet::parse(Some(skills)),
            software: RequirementSet::parse(Some(software)),
            degrees: RequirementSet::default(),
            seniority: Some("senior".to_string()),
            periods: Vec::new(),
        }
    }

    #[test]
    fn test_scenario_half_skill_coverage_reports_gap() {
        // Job requires {sql, agile}, profile has {sql}.
        let job = make_job("sql;agile", "", "");
        let profile = make_profile("sql", "");

        let result = score(&profile, &job, &CategoryWeights::default());
        assert!((result.skills.coverage - 0.5).abs() < f64::EPSILON);
        assert!(result.gap_list.contains(&"agile".to_string()));
        assert_eq!(result.skills.matched, vec!["sql"]);
    }

    #[test]
    fn test_fit_score_is_bounded() {
        let job = make_job("sql;agile;scrum", "jira;figma", "mba");
        let full = make_profile("sql;agile;scrum", "jira;figma");
        let empty = make_profile("", "");

        for profile in [&full, &empty] {
            let result = score(profile, &job, &CategoryWeights::default());
            assert!((0.0..=1.0).contains(&result.fit_score));
        }
    }

    #[test]
    fn test_empty_job_category_scores_full_coverage() {
        let job = make_job("sql", "", "");
        let profile = make_profile("", "");

        let result = score(&profile, &job, &CategoryWeights::default());
        assert_eq!(result.software.coverage, 1.0);
        assert_eq!(result.degrees.coverage, 1.0);
        assert_eq!(result.skills.coverage, 0.0);
    }

    #[test]
    fn test_empty_profile_yields_full_gap_list_not_a_crash() {
        let job = make_job("sql;agile", "jira", "");
        let profile = make_profile("", "");

        let result = score(&profile, &job, &CategoryWeights::default());
        assert_eq!(result.gap_list, vec!["sql", "agile", "jira"]);
        assert_eq!(result.fit_score, 0.2); // only the empty degrees category
    }

    #[test]
    fn test_gap_list_ordered_by_weight_then_first_seen() {
        let job = make_job("zeta;alpha", "omega;beta", "phd");
        let profile = make_profile("", "");

        let result = score(&profile, &job, &CategoryWeights::default());
        // Skills (0.5) before software (0.3) before degrees (0.2), each in
        // original order of appearance.
        assert_eq!(result.gap_list, vec!["zeta", "alpha", "omega", "beta", "phd"]);
    }

    #[test]
    fn test_score_is_deterministic() {
        let job = make_job("sql;agile;scrum", "jira", "mba");
        let profile = make_profile("agile;sql", "jira");

        let a = score(&profile, &job, &CategoryWeights::default());
        let b = score(&profile, &job, &CategoryWeights::default());
        assert_eq!(a.fit_score, b.fit_score);
        assert_eq!(a.gap_list, b.gap_list);
    }

    #[test]
    fn test_default_weights_are_normalized() {
        assert!(CategoryWeights::default().is_normalized());
        let skewed = CategoryWeights {
            skills: 0.9,
            software: 0.3,
            degrees: 0.2,
        };
        assert!(!skewed.is_normalized());
    }

    #[test]
    fn test_seniority_alignment_distance() {
        let job = make_job("", "", "");
        let mut profile = make_profile("", "");
        assert_eq!(seniority_alignment(&profile, &job), Some(1.0));

        profile.seniority = Some("junior".to_string());
        assert_eq!(seniority_alignment(&profile, &job), Some(0.6));

        profile.seniority = None;
        assert_eq!(seniority_alignment(&profile, &job), None);
    }
}
