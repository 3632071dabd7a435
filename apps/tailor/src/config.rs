use anyhow::{Context, Result};

use crate::matching::scoring::CategoryWeights;

/// Application configuration loaded from environment variables. All values
/// are optional; the pipeline runs without an API key (generation falls
/// back to the deterministic template).
#[derive(Debug, Clone)]
pub struct Config {
    /// API keys for the generation backend, comma separated in
    /// `TAILOR_API_KEYS`. Empty means generation is skipped.
    pub api_keys: Vec<String>,
    pub weights: CategoryWeights,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_keys = std::env::var("TAILOR_API_KEYS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let weights = CategoryWeights {
            skills: weight_env("TAILOR_WEIGHT_SKILLS", 0.5)?,
            software: weight_env("TAILOR_WEIGHT_SOFTWARE", 0.3)?,
            degrees: weight_env("TAILOR_WEIGHT_DEGREES", 0.2)?,
        };
        if !weights.is_normalized() {
            anyhow::bail!(
                "category weights must sum to 1.0 (got skills={} software={} degrees={})",
                weights.skills,
                weights.software,
                weights.degrees
            );
        }

        Ok(Config {
            api_keys,
            weights,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn weight_env(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("'{key}' must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
