//! Directory-backed candidate profile store.
//!
//! Profiles are static JSON documents, one file per profile, named
//! `<profile>.json` inside a profiles directory. They are read once per run
//! and never written back.

use std::path::PathBuf;

use tracing::debug;

use super::IngestError;
use crate::models::profile::CandidateProfile;

#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ProfileStore { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Loads the named profile. A missing file is `UnknownProfile`; any
    /// other read failure or malformed JSON surfaces as is.
    pub fn load(&self, name: &str) -> Result<CandidateProfile, IngestError> {
        let path = self.path_for(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IngestError::UnknownProfile(name.to_string()));
            }
            Err(e) => {
                return Err(IngestError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        let profile: CandidateProfile =
            serde_json::from_str(&raw).map_err(|e| IngestError::Json {
                path: path.display().to_string(),
                source: e,
            })?;

        debug!(
            profile = %profile.name,
            periods = profile.periods.len(),
            "loaded candidate profile"
        );
        Ok(profile)
    }

    /// Profile names available in the directory, for the unknown-profile
    /// error path.
    pub fn available(&self) -> Result<Vec<String>, IngestError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| IngestError::Io {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::Io {
                path: self.dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_JSON: &str = r#"{
        "name": "product_management",
        "skills": ["SQL", "Agile"],
        "software": "Jira; Figma",
        "periods": [
            {
                "start": "11/2023",
                "end": "Present",
                "employer": "GCA",
                "title": "Product Analyst"
            }
        ]
    }"#;

    #[test]
    fn test_load_reads_named_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("product_management.json"), PROFILE_JSON).unwrap();

        let store = ProfileStore::new(dir.path());
        let profile = store.load("product_management").unwrap();
        assert_eq!(profile.name, "product_management");
        assert_eq!(profile.periods.len(), 1);
    }

    #[test]
    fn test_missing_profile_is_unknown_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        assert!(matches!(
            store.load("nope"),
            Err(IngestError::UnknownProfile(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let store = ProfileStore::new(dir.path());
        assert!(matches!(store.load("bad"), Err(IngestError::Json { .. })));
    }

    #[test]
    fn test_available_lists_json_stems_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), PROFILE_JSON).unwrap();
        std::fs::write(dir.path().join("a.json"), PROFILE_JSON).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let store = ProfileStore::new(dir.path());
        assert_eq!(store.available().unwrap(), vec!["a", "b"]);
    }
}
