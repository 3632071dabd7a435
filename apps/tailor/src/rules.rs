//! Bullet-Pool Rule Table — the source of truth for which title
//! substitutions are legal.
//!
//! Each rule maps a career period, keyed by its (start, end) date pair, to
//! an ordered list of allowed title variants (rank 0 = top preference). A
//! single-element list means "no alternative — never rewrite". The optional
//! employer tag is carried for audit logging only; it plays no part in
//! selection.
//!
//! The table is validated at load time: an empty option list, a duplicate
//! period key, or a second open-ended ("Present") entry is a configuration
//! defect and rejected before any document is touched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::profile::{CandidateProfile, CareerPeriod, PeriodEnd, PeriodKey};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("no bullet-pool rule covers period {0}")]
    NotFound(PeriodKeyDisplay),

    #[error("bullet-pool rule for period {0} has an empty title list")]
    EmptyTitles(PeriodKeyDisplay),

    #[error("duplicate bullet-pool rule for period {0}")]
    DuplicatePeriod(PeriodKeyDisplay),

    #[error("more than one bullet-pool rule ends in Present ({0} and {1})")]
    DuplicatePresent(PeriodKeyDisplay, PeriodKeyDisplay),

    #[error("failed to parse bullet-pool rules: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Owned, displayable period key for error messages.
#[derive(Debug, Clone)]
pub struct PeriodKeyDisplay(String);

impl std::fmt::Display for PeriodKeyDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PeriodKey> for PeriodKeyDisplay {
    fn from(key: PeriodKey) -> Self {
        PeriodKeyDisplay(key.to_string())
    }
}

/// One rule: a period and its ordered pool of allowed titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRule {
    #[serde(flatten)]
    period: RulePeriod,
    pub titles: Vec<String>,
    #[serde(default)]
    pub employer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RulePeriod {
    start: String,
    end: String,
}

impl TitleRule {
    pub fn new(
        start: &str,
        end: &str,
        titles: &[&str],
        employer: Option<&str>,
    ) -> Self {
        TitleRule {
            period: RulePeriod {
                start: start.to_string(),
                end: end.to_string(),
            },
            titles: titles.iter().map(|t| t.to_string()).collect(),
            employer: employer.map(str::to_string),
        }
    }

    fn key(&self) -> Result<PeriodKey, RuleError> {
        let start = self
            .period
            .start
            .parse()
            .map_err(|_| RuleError::Parse(invalid_date(&self.period.start)))?;
        let end: PeriodEnd = self
            .period
            .end
            .parse()
            .map_err(|_| RuleError::Parse(invalid_date(&self.period.end)))?;
        Ok(PeriodKey { start, end })
    }

    /// Top-preference title. Load-time validation guarantees non-emptiness.
    pub fn preferred(&self) -> &str {
        &self.titles[0]
    }

    pub fn allows(&self, title: &str) -> bool {
        self.titles.iter().any(|t| t == title)
    }
}

fn invalid_date(raw: &str) -> serde_json::Error {
    serde::de::Error::custom(format!("invalid period date '{raw}'"))
}

/// The immutable rule table.
#[derive(Debug, Clone)]
pub struct BulletPool {
    rules: Vec<(PeriodKey, TitleRule)>,
}

impl BulletPool {
    /// Builds and validates a pool from raw rules.
    pub fn from_rules(rules: Vec<TitleRule>) -> Result<Self, RuleError> {
        let mut seen: HashSet<PeriodKey> = HashSet::new();
        let mut present: Option<PeriodKey> = None;
        let mut keyed = Vec::with_capacity(rules.len());

        for rule in rules {
            let key = rule.key()?;
            if rule.titles.is_empty() {
                return Err(RuleError::EmptyTitles(key.into()));
            }
            if !seen.insert(key) {
                return Err(RuleError::DuplicatePeriod(key.into()));
            }
            if key.end == PeriodEnd::Present {
                if let Some(existing) = present {
                    return Err(RuleError::DuplicatePresent(existing.into(), key.into()));
                }
                present = Some(key);
            }
            keyed.push((key, rule));
        }

        Ok(BulletPool { rules: keyed })
    }

    /// Parses a JSON array of rules, then validates.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let rules: Vec<TitleRule> = serde_json::from_str(json)?;
        Self::from_rules(rules)
    }

    /// The built-in table for the default candidate history. Used when no
    /// rules file is supplied.
    pub fn builtin() -> Self {
        let rules = vec![
            TitleRule::new(
                "11/2023",
                "Present",
                &[
                    "Product Manager",
                    "Product Owner",
                    "Product Analyst",
                    "Project Manager",
                    "Business Analyst",
                ],
                Some("GCA"),
            ),
            TitleRule::new(
                "08/2022",
                "11/2023",
                &["Product Operations Specialist"],
                Some("GCA"),
            ),
            TitleRule::new(
                "08/2020",
                "11/2021",
                &[
                    "Product Manager",
                    "Product Owner",
                    "Project Manager",
                    "Business Analyst",
                ],
                Some("Loszen"),
            ),
            TitleRule::new(
                "11/2021",
                "08/2022",
                &["Quality Assurance Analyst"],
                Some("Industrias de Tapas Taime"),
            ),
            TitleRule::new(
                "11/2019",
                "07/2020",
                &["Quality Analyst"],
                Some("Industrias QProductos"),
            ),
        ];
        // The built-in table is statically valid.
        Self::from_rules(rules).expect("builtin bullet-pool table must validate")
    }

    /// Looks up the rule for a career period. A miss is a configuration
    /// defect (the profile names a period the table does not cover), never
    /// a condition to silently skip.
    pub fn rules_for(&self, period: &CareerPeriod) -> Result<&TitleRule, RuleError> {
        let key = period.key();
        self.rules
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, rule)| rule)
            .ok_or(RuleError::NotFound(key.into()))
    }

    /// Verifies totality: every period in the profile has a rule. Called
    /// before processing so the mismatch aborts up front.
    pub fn verify_covers(&self, profile: &CandidateProfile) -> Result<(), RuleError> {
        for period in &profile.periods {
            self.rules_for(period)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: &str, end: &str) -> CareerPeriod {
        CareerPeriod {
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            employer: "GCA".to_string(),
            title: "Product Analyst".to_string(),
        }
    }

    #[test]
    fn test_builtin_table_covers_known_periods() {
        let pool = BulletPool::builtin();
        assert_eq!(pool.len(), 5);

        let rule = pool.rules_for(&period("11/2023", "Present")).unwrap();
        assert_eq!(rule.preferred(), "Product Manager");
        assert_eq!(rule.titles.len(), 5);

        let single = pool.rules_for(&period("08/2022", "11/2023")).unwrap();
        assert_eq!(single.titles, vec!["Product Operations Specialist"]);
    }

    #[test]
    fn test_unknown_period_is_a_rule_not_found_error() {
        let pool = BulletPool::builtin();
        let err = pool.rules_for(&period("01/2010", "02/2011")).unwrap_err();
        assert!(matches!(err, RuleError::NotFound(_)));
        assert!(err.to_string().contains("01/2010-02/2011"));
    }

    #[test]
    fn test_empty_title_list_rejected_at_load() {
        let rules = vec![TitleRule::new("01/2020", "02/2021", &[], None)];
        assert!(matches!(
            BulletPool::from_rules(rules),
            Err(RuleError::EmptyTitles(_))
        ));
    }

    #[test]
    fn test_duplicate_period_rejected_at_load() {
        let rules = vec![
            TitleRule::new("01/2020", "02/2021", &["A"], None),
            TitleRule::new("01/2020", "02/2021", &["B"], None),
        ];
        assert!(matches!(
            BulletPool::from_rules(rules),
            Err(RuleError::DuplicatePeriod(_))
        ));
    }

    #[test]
    fn test_second_present_entry_rejected_at_load() {
        let rules = vec![
            TitleRule::new("01/2020", "Present", &["A"], None),
            TitleRule::new("03/2022", "Present", &["B"], None),
        ];
        assert!(matches!(
            BulletPool::from_rules(rules),
            Err(RuleError::DuplicatePresent(_, _))
        ));
    }

    #[test]
    fn test_from_json_parses_and_validates() {
        let json = r#"[
            {
                "start": "11/2023",
                "end": "Present",
                "titles": ["Product Manager", "Product Owner"],
                "employer": "GCA"
            }
        ]"#;
        let pool = BulletPool::from_json(json).unwrap();
        let rule = pool.rules_for(&period("11/2023", "Present")).unwrap();
        assert!(rule.allows("Product Owner"));
        assert!(!rule.allows("Staff Engineer"));
        assert_eq!(rule.employer.as_deref(), Some("GCA"));
    }

    #[test]
    fn test_verify_covers_flags_uncovered_profile_period() {
        use crate::matching::normalizer::RequirementSet;
        use crate::models::profile::CandidateProfile;

        let pool = BulletPool::builtin();
        let profile = CandidateProfile {
            name: "p".to_string(),
            skills: RequirementSet::default(),
            software: RequirementSet::default(),
            degrees: RequirementSet::default(),
            seniority: None,
            periods: vec![period("01/2010", "02/2011")],
        };
        assert!(pool.verify_covers(&profile).is_err());
    }
}
