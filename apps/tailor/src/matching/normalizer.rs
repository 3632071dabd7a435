//! Requirement Normalizer — turns raw delimiter-separated requirement text
//! into canonical token sets.
//!
//! Job postings arrive with skills/software/degrees as `;`- (sometimes `,`-)
//! separated strings of inconsistent casing and spacing. Malformed or absent
//! input degrades to the empty set — the caller treats that as "no
//! requirement data", never as an error.

use std::collections::HashSet;

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// A canonical set of requirement tokens: trimmed, lowercased, deduplicated.
///
/// First-seen order is preserved because gap lists must report tokens in
/// their original order of appearance within the job record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    tokens: Vec<String>,
    index: HashSet<String>,
}

impl RequirementSet {
    /// Parses a raw delimiter-separated string. `None` or unusable input
    /// yields the empty set.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(text) => text.split([';', ',']).collect(),
            None => Self::default(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains(token)
    }

    /// Tokens in first-seen order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn insert(&mut self, raw: &str) {
        let token = raw.trim().to_lowercase();
        if token.is_empty() || self.index.contains(&token) {
            return;
        }
        self.index.insert(token.clone());
        self.tokens.push(token);
    }
}

impl<S: AsRef<str>> FromIterator<S> for RequirementSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        for item in iter {
            set.insert(item.as_ref());
        }
        set
    }
}

impl Serialize for RequirementSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.tokens.len()))?;
        for token in &self.tokens {
            seq.serialize_element(token)?;
        }
        seq.end()
    }
}

/// Accepts either a list of strings or a single delimiter-separated string,
/// canonicalizing both. Missing fields default to the empty set at the
/// struct level (`#[serde(default)]`).
impl<'de> Deserialize<'de> for RequirementSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Many(Vec<String>),
            One(String),
            None(()),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Many(items) => Ok(items.iter().map(String::as_str).collect()),
            Raw::One(text) => Ok(RequirementSet::parse(Some(&text))),
            Raw::None(()) => Ok(RequirementSet::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_lowercases_and_dedupes() {
        let set = RequirementSet::parse(Some("SQL; Agile ;sql;  Scrum"));
        assert_eq!(set.tokens(), &["sql", "agile", "scrum"]);
        assert!(set.contains("sql"));
        assert!(set.contains("agile"));
        assert!(!set.contains("SQL"));
    }

    #[test]
    fn test_parse_handles_mixed_delimiters() {
        let set = RequirementSet::parse(Some("sql, agile; jira ,"));
        assert_eq!(set.tokens(), &["sql", "agile", "jira"]);
    }

    #[test]
    fn test_parse_absent_or_blank_yields_empty_set() {
        assert!(RequirementSet::parse(None).is_empty());
        assert!(RequirementSet::parse(Some("")).is_empty());
        assert!(RequirementSet::parse(Some(" ; ; ,")).is_empty());
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let set = RequirementSet::parse(Some("zeta;alpha;midway;alpha"));
        assert_eq!(set.tokens(), &["zeta", "alpha", "midway"]);
    }

    #[test]
    fn test_deserializes_from_list_and_string() {
        let from_list: RequirementSet = serde_json::from_str(r#"["SQL", " Agile "]"#).unwrap();
        let from_string: RequirementSet = serde_json::from_str(r#""SQL; Agile""#).unwrap();
        assert_eq!(from_list, from_string);
        assert_eq!(from_list.tokens(), &["sql", "agile"]);
    }

    #[test]
    fn test_serializes_as_token_list() {
        let set = RequirementSet::parse(Some("SQL; Agile"));
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["sql","agile"]"#);
    }
}
