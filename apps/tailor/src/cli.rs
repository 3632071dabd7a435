use std::path::PathBuf;

use clap::Parser;

/// Tailors a résumé document to one scraped job posting: scores the fit,
/// substitutes period titles from the rule table, validates formatting, and
/// writes the tailored copy without overwriting anything.
#[derive(Debug, Parser)]
#[command(name = "tailor", version, about)]
pub struct Cli {
    /// CSV of scraped job postings.
    #[arg(long)]
    pub jobs_csv: PathBuf,

    /// Id of the posting to tailor against.
    #[arg(long)]
    pub job_id: String,

    /// Candidate profile name (resolved to <profiles-dir>/<name>.json).
    #[arg(long, default_value = "product_management")]
    pub profile: String,

    /// Directory holding profile JSON files.
    #[arg(long, default_value = "profiles")]
    pub profiles_dir: PathBuf,

    /// Bullet-pool rules JSON. Defaults to the built-in table.
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// The résumé document to tailor.
    #[arg(long)]
    pub document: PathBuf,

    /// Output path. Defaults to <document stem>_<job-id>.<ext> next to the
    /// input.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Run the full pipeline and report, but write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip LLM content generation even when API keys are configured.
    #[arg(long)]
    pub skip_generation: bool,
}

impl Cli {
    /// Resolves the output path from `--output` or the document name.
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let stem = self
            .document
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("resume");
        let ext = self
            .document
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("txt");
        self.document
            .with_file_name(format!("{stem}_{}.{ext}", self.job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_derived_from_document_and_job_id() {
        let cli = Cli::parse_from([
            "tailor",
            "--jobs-csv",
            "jobs.csv",
            "--job-id",
            "J-100",
            "--document",
            "docs/resume.txt",
        ]);
        assert_eq!(cli.output_path(), PathBuf::from("docs/resume_J-100.txt"));
    }

    #[test]
    fn test_explicit_output_wins() {
        let cli = Cli::parse_from([
            "tailor",
            "--jobs-csv",
            "jobs.csv",
            "--job-id",
            "J-100",
            "--document",
            "resume.txt",
            "--output",
            "out/final.txt",
        ]);
        assert_eq!(cli.output_path(), PathBuf::from("out/final.txt"));
    }
}
