mod cli;
mod config;
mod errors;
mod generation;
mod ingest;
mod llm_client;
mod matching;
mod models;
mod rewrite;
mod rules;
mod validation;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;
use crate::errors::AppError;
use crate::generation::{ContentGenerator, LlmContentGenerator, TemplateContentGenerator};
use crate::ingest::job_store::CsvJobStore;
use crate::ingest::profile_store::ProfileStore;
use crate::llm_client::LlmClient;
use crate::matching::scoring::{score, seniority_alignment};
use crate::rewrite::document::{PlainTextDocument, TextDocument};
use crate::rewrite::engine::{apply, Outcome};
use crate::rules::BulletPool;
use crate::validation::validate;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor v{}", env!("CARGO_PKG_VERSION"));

    run(cli, config).await?;
    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    // 1. Load the posting and the candidate profile.
    let jobs = CsvJobStore::load(&cli.jobs_csv)?;
    info!(count = jobs.len(), "job store loaded");
    let job = jobs.find(&cli.job_id)?;

    let profiles = ProfileStore::new(&cli.profiles_dir);
    let profile = match profiles.load(&cli.profile) {
        Ok(profile) => profile,
        Err(e @ ingest::IngestError::UnknownProfile(_)) => {
            if let Ok(names) = profiles.available() {
                warn!(available = ?names, "profile not found");
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    // 2. Score the fit. Informational; a weak fit never blocks tailoring.
    let result = score(&profile, job, &config.weights);
    info!(
        job_id = %job.job_id,
        fit_score = format!("{:.2}", result.fit_score),
        "fit computed"
    );
    if !result.gap_list.is_empty() {
        info!(gaps = ?result.gap_list, "requirements not covered by profile");
    }
    match seniority_alignment(&profile, job) {
        Some(signal) => info!(signal = format!("{signal:.1}"), "seniority alignment"),
        None => info!("seniority alignment unknown"),
    }

    // 3. Load the rule table and verify it covers every profile period.
    let pool = match &cli.rules {
        Some(path) => BulletPool::from_json(&std::fs::read_to_string(path)?)?,
        None => BulletPool::builtin(),
    };
    pool.verify_covers(&profile)?;

    // 4. Rewrite period titles in the document.
    let original = PlainTextDocument::from_text(&std::fs::read_to_string(&cli.document)?);
    let (rewritten, results) = apply(original.clone(), &profile, &pool)?;

    for item in &results {
        let period = item.period.key().to_string();
        match &item.outcome {
            Outcome::Replaced { previous, selected } => {
                info!(%period, from = %previous, to = %selected, "title replaced");
            }
            Outcome::Unchanged { current, reason } => {
                info!(%period, title = %current, ?reason, "title kept");
            }
            Outcome::SpanNotFound => {
                warn!(%period, "period span not found in document, skipped");
            }
        }
    }

    // 5. Validate the rewrite. A rejected document is never written.
    let report = validate(&original, &rewritten, &results, &pool);
    for period in &report.skipped_periods {
        warn!(%period, "no substitution applied for period");
    }
    if !report.accepted {
        let details = report
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Rejected(details));
    }
    info!("validation passed");

    if cli.dry_run {
        info!("dry run, nothing written");
        return Ok(());
    }

    // 6. Write the tailored document, never clobbering an existing file.
    let written = save_without_overwrite(&cli.output_path(), &rewritten.as_text())?;
    info!(path = %written.display(), "tailored document written");

    // 7. Optional content generation sidecar.
    if cli.skip_generation {
        info!("content generation skipped by flag");
        return Ok(());
    }
    let content = if config.api_keys.is_empty() {
        info!("no API keys configured, using template content");
        TemplateContentGenerator.generate(&profile, job).await?
    } else {
        let client = LlmClient::new(config.api_keys.clone())?;
        LlmContentGenerator::new(client).generate(&profile, job).await?
    };
    let sidecar = written.with_extension("content.json");
    let sidecar = save_without_overwrite(
        &sidecar,
        &serde_json::to_string_pretty(&content).map_err(anyhow::Error::from)?,
    )?;
    info!(path = %sidecar.display(), backend = content.backend, "content sidecar written");

    Ok(())
}

/// Writes `contents` to `path`, or to a timestamp-suffixed sibling when the
/// path is already taken. Existing files are never overwritten.
fn save_without_overwrite(path: &Path, contents: &str) -> Result<PathBuf, AppError> {
    let target = if path.exists() {
        let stamped = stamped_sibling(path);
        warn!(
            requested = %path.display(),
            actual = %stamped.display(),
            "output exists, writing timestamped copy"
        );
        stamped
    } else {
        path.to_path_buf()
    };

    if target.exists() {
        return Err(AppError::WouldOverwrite(target.display().to_string()));
    }
    std::fs::write(&target, contents)?;
    Ok(target)
}

fn stamped_sibling(path: &Path) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => path.with_file_name(format!("{stem}_{stamp}.{ext}")),
        None => path.with_file_name(format!("{stem}_{stamp}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_fresh_path_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        let written = save_without_overwrite(&path, "hello").unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_save_never_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "original").unwrap();

        let written = save_without_overwrite(&path, "tailored").unwrap();
        assert_ne!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "tailored");

        let name = written.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("resume_"));
        assert!(name.ends_with(".txt"));
    }
}
