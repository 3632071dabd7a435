//! Normalized job-posting models.

use serde::{Deserialize, Serialize};

use crate::matching::normalizer::RequirementSet;

/// Seniority ladder used for the logged seniority-distance signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Intern,
    Junior,
    Mid,
    Senior,
    Lead,
    Manager,
    Director,
    #[default]
    Unknown,
}

impl Seniority {
    /// Normalizes free-text seniority values ("Sr", "middle", "mgr", ...).
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "intern" | "internship" => Seniority::Intern,
            "junior" | "jr" => Seniority::Junior,
            "mid" | "middle" | "intermediate" => Seniority::Mid,
            "senior" | "sr" => Seniority::Senior,
            "lead" => Seniority::Lead,
            "manager" | "mgr" => Seniority::Manager,
            "director" | "dir" => Seniority::Director,
            _ => Seniority::Unknown,
        }
    }

    /// Rank on the ladder, or None when unknown.
    pub fn rank(self) -> Option<u8> {
        match self {
            Seniority::Intern => Some(0),
            Seniority::Junior => Some(1),
            Seniority::Mid => Some(2),
            Seniority::Senior => Some(3),
            Seniority::Lead => Some(4),
            Seniority::Manager => Some(5),
            Seniority::Director => Some(6),
            Seniority::Unknown => None,
        }
    }
}

/// A normalized job posting. Immutable once loaded from the job store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequirement {
    pub job_id: String,
    pub title: String,
    pub title_short: String,
    pub company: String,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub schedule_type: Option<String>,
    pub experience_years: Option<String>,
    pub seniority: Seniority,
    pub skills: RequirementSet,
    pub software: RequirementSet,
    pub degrees: RequirementSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seniority_normalization_aliases() {
        assert_eq!(Seniority::normalize("Sr"), Seniority::Senior);
        assert_eq!(Seniority::normalize("MIDDLE"), Seniority::Mid);
        assert_eq!(Seniority::normalize("mgr"), Seniority::Manager);
        assert_eq!(Seniority::normalize("wizard"), Seniority::Unknown);
    }

    #[test]
    fn test_unknown_seniority_has_no_rank() {
        assert_eq!(Seniority::Unknown.rank(), None);
        assert_eq!(Seniority::Director.rank(), Some(6));
    }
}
