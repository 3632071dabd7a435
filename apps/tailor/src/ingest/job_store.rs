//! CSV-backed job store.
//!
//! Scraped postings arrive as one CSV per batch with free-text requirement
//! columns. Rows are normalized into `JobRequirement` at load time so the
//! rest of the pipeline never sees raw CSV text.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::IngestError;
use crate::matching::normalizer::RequirementSet;
use crate::models::job::{JobRequirement, Seniority};

/// One raw CSV row, column names as the scraper emits them.
#[derive(Debug, Deserialize)]
struct JobRow {
    job_id: String,
    job_title_original: String,
    job_title_short: String,
    company: String,
    country: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    state: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    schedule_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    experience_years: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    seniority: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    degrees: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    software: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl From<JobRow> for JobRequirement {
    fn from(row: JobRow) -> Self {
        JobRequirement {
            seniority: row
                .seniority
                .as_deref()
                .map(Seniority::normalize)
                .unwrap_or_default(),
            skills: RequirementSet::parse(row.skills.as_deref()),
            software: RequirementSet::parse(row.software.as_deref()),
            degrees: RequirementSet::parse(row.degrees.as_deref()),
            job_id: row.job_id,
            title: row.job_title_original,
            title_short: row.job_title_short,
            company: row.company,
            country: row.country,
            state: row.state,
            city: row.city,
            schedule_type: row.schedule_type,
            experience_years: row.experience_years,
        }
    }
}

/// In-memory index of one scraped CSV, keyed by job id. Later rows with a
/// duplicate id are dropped; the first occurrence wins.
#[derive(Debug, Default)]
pub struct CsvJobStore {
    jobs: HashMap<String, JobRequirement>,
}

impl CsvJobStore {
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let path_display = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(&path_display, e))?;

        let mut jobs: HashMap<String, JobRequirement> = HashMap::new();
        for row in reader.deserialize::<JobRow>() {
            let row = row.map_err(|e| csv_error(&path_display, e))?;
            let job = JobRequirement::from(row);
            if jobs.contains_key(&job.job_id) {
                debug!(job_id = %job.job_id, "duplicate job id in CSV, keeping first row");
                continue;
            }
            jobs.insert(job.job_id.clone(), job);
        }

        debug!(path = %path_display, count = jobs.len(), "loaded job store");
        Ok(CsvJobStore { jobs })
    }

    pub fn from_csv_str(data: &str) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());

        let mut jobs: HashMap<String, JobRequirement> = HashMap::new();
        for row in reader.deserialize::<JobRow>() {
            let row = row.map_err(|e| csv_error("<inline>", e))?;
            let job = JobRequirement::from(row);
            jobs.entry(job.job_id.clone()).or_insert(job);
        }
        Ok(CsvJobStore { jobs })
    }

    pub fn find(&self, job_id: &str) -> Result<&JobRequirement, IngestError> {
        self.jobs
            .get(job_id)
            .ok_or_else(|| IngestError::UnknownJob(job_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

fn csv_error(path: &str, source: csv::Error) -> IngestError {
    IngestError::Csv {
        path: path.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "job_id,job_title_original,job_title_short,company,country,state,city,schedule_type,experience_years,seniority,skills,degrees,software";

    #[test]
    fn test_row_normalization() {
        let csv = format!(
            "{HEADER}\n\
             J-100,Senior Product Manager,Product Manager,Acme,US,CA,San Jose,Full-time,5+,Senior,\"SQL; Agile, Roadmapping\",Bachelor,\"Jira;Figma\"\n"
        );
        let store = CsvJobStore::from_csv_str(&csv).unwrap();
        let job = store.find("J-100").unwrap();

        assert_eq!(job.title, "Senior Product Manager");
        assert_eq!(job.seniority, Seniority::Senior);
        assert_eq!(job.skills.tokens(), ["sql", "agile", "roadmapping"]);
        assert_eq!(job.software.tokens(), ["jira", "figma"]);
        assert_eq!(job.degrees.tokens(), ["bachelor"]);
        assert_eq!(job.state.as_deref(), Some("CA"));
    }

    #[test]
    fn test_blank_optional_columns_become_none() {
        let csv = format!("{HEADER}\nJ-1,PM,PM,Acme,US,,,,,,,,\n");
        let store = CsvJobStore::from_csv_str(&csv).unwrap();
        let job = store.find("J-1").unwrap();

        assert!(job.state.is_none());
        assert!(job.schedule_type.is_none());
        assert_eq!(job.seniority, Seniority::Unknown);
        assert!(job.skills.is_empty());
    }

    #[test]
    fn test_duplicate_job_id_keeps_first_row() {
        let csv = format!(
            "{HEADER}\nJ-1,First,PM,Acme,US,,,,,,,,\nJ-1,Second,PM,Acme,US,,,,,,,,\n"
        );
        let store = CsvJobStore::from_csv_str(&csv).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("J-1").unwrap().title, "First");
    }

    #[test]
    fn test_missing_job_id_is_unknown_job() {
        let csv = format!("{HEADER}\nJ-1,PM,PM,Acme,US,,,,,,,,\n");
        let store = CsvJobStore::from_csv_str(&csv).unwrap();
        assert!(matches!(
            store.find("J-404"),
            Err(IngestError::UnknownJob(id)) if id == "J-404"
        ));
    }

    #[test]
    fn test_malformed_csv_is_an_error() {
        let csv = format!("{HEADER}\nJ-1,only-two-fields\n");
        assert!(matches!(
            CsvJobStore::from_csv_str(&csv),
            Err(IngestError::Csv { .. })
        ));
    }
}
