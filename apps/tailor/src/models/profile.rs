//! Candidate profile models: capability sets plus the career-period history
//! that drives title substitution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::normalizer::RequirementSet;

#[derive(Debug, Error)]
#[error("invalid period date '{0}' (expected MM/YYYY or Present)")]
pub struct DateParseError(String);

/// A month/year pair as it appears in résumé date ranges, e.g. `08/2022`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl FromStr for MonthYear {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DateParseError(s.to_string());
        let (month, year) = s.trim().split_once('/').ok_or_else(err)?;
        let month: u32 = month.parse().map_err(|_| err())?;
        let year: i32 = year.parse().map_err(|_| err())?;
        if !(1..=12).contains(&month) || !(1900..=2100).contains(&year) {
            return Err(err());
        }
        Ok(MonthYear { year, month })
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// The end of a career period: a concrete month or the open-ended sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodEnd {
    Month(MonthYear),
    Present,
}

impl FromStr for PeriodEnd {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("present") || trimmed.eq_ignore_ascii_case("current") {
            return Ok(PeriodEnd::Present);
        }
        trimmed.parse().map(PeriodEnd::Month)
    }
}

impl fmt::Display for PeriodEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodEnd::Month(m) => m.fmt(f),
            PeriodEnd::Present => f.write_str("Present"),
        }
    }
}

/// The (start, end) pair identifying a career period. This is the lookup key
/// into the bullet-pool rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub start: MonthYear,
    pub end: PeriodEnd,
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One contiguous employment interval in the candidate's history.
///
/// `title` is the literal title text exactly as it currently appears in the
/// document — the substitution engine searches for these bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerPeriod {
    #[serde(with = "month_year_string")]
    pub start: MonthYear,
    #[serde(with = "period_end_string")]
    pub end: PeriodEnd,
    pub employer: String,
    pub title: String,
}

impl CareerPeriod {
    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            start: self.start,
            end: self.end,
        }
    }
}

/// A named bundle of capability sets plus career periods. Loaded once per
/// run from a static JSON profile; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    #[serde(default)]
    pub skills: RequirementSet,
    #[serde(default)]
    pub software: RequirementSet,
    /// Optional: most profiles omit this, leaving degrees coverage to the
    /// job side (an empty job degree set scores 1.0 regardless).
    #[serde(default)]
    pub degrees: RequirementSet,
    #[serde(default)]
    pub seniority: Option<String>,
    pub periods: Vec<CareerPeriod>,
}

mod month_year_string {
    use super::MonthYear;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &MonthYear, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MonthYear, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

mod period_end_string {
    use super::PeriodEnd;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &PeriodEnd, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PeriodEnd, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_year_round_trips_with_zero_padding() {
        let date: MonthYear = "08/2022".parse().unwrap();
        assert_eq!(date.month, 8);
        assert_eq!(date.year, 2022);
        assert_eq!(date.to_string(), "08/2022");
    }

    #[test]
    fn test_period_end_accepts_present_and_current() {
        assert_eq!("Present".parse::<PeriodEnd>().unwrap(), PeriodEnd::Present);
        assert_eq!("current".parse::<PeriodEnd>().unwrap(), PeriodEnd::Present);
        assert_eq!(
            "11/2023".parse::<PeriodEnd>().unwrap(),
            PeriodEnd::Month("11/2023".parse().unwrap())
        );
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        assert!("13/2022".parse::<MonthYear>().is_err());
        assert!("08-2022".parse::<MonthYear>().is_err());
        assert!("soon".parse::<PeriodEnd>().is_err());
    }

    #[test]
    fn test_period_key_display_matches_document_shape() {
        let period = CareerPeriod {
            start: "11/2023".parse().unwrap(),
            end: PeriodEnd::Present,
            employer: "GCA".to_string(),
            title: "Product Analyst".to_string(),
        };
        assert_eq!(period.key().to_string(), "11/2023-Present");
    }

    #[test]
    fn test_profile_deserializes_from_json() {
        let json = r#"{
            "name": "product_management",
            "skills": ["SQL", "Agile", "Roadmapping"],
            "software": "Jira; Figma",
            "seniority": "senior",
            "periods": [
                {
                    "start": "11/2023",
                    "end": "Present",
                    "employer": "GCA",
                    "title": "Product Analyst"
                }
            ]
        }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.skills.tokens(), &["sql", "agile", "roadmapping"]);
        assert_eq!(profile.software.tokens(), &["jira", "figma"]);
        assert!(profile.degrees.is_empty());
        assert_eq!(profile.periods[0].end, PeriodEnd::Present);
    }
}
