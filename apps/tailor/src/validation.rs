//! Validation Gate — post-substitution invariant checker.
//!
//! Recomputes formatting properties from the original and rewritten
//! documents and rejects any rewrite that disturbed layout, dates, or
//! untouched content. The gate only reports; it never repairs a violation.

use serde::Serialize;
use thiserror::Error;

use crate::rewrite::document::TextDocument;
use crate::rewrite::engine::{Outcome, SubstitutionResult};
use crate::rules::BulletPool;

/// Tokens that must never appear in rewritten content. Leaked scaffolding
/// or classification markers reject the document outright.
const FORBIDDEN_TOKENS: &[&str] = &[
    "confidential",
    "secret",
    "proprietary",
    "lorem ipsum",
    "placeholder",
    "sample",
    "{{",
    "}}",
];

/// One broken invariant, naming exactly what failed.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "invariant", rename_all = "snake_case")]
pub enum Violation {
    #[error("run {run_index}: tab count changed from {before} to {after}")]
    TabCountChanged {
        run_index: usize,
        before: usize,
        after: usize,
    },

    #[error("run {run_index}: rewrite introduced consecutive spaces")]
    DoubleSpaceIntroduced { run_index: usize },

    #[error("run {run_index}: date substring '{expected}' missing after rewrite")]
    DateAltered { run_index: usize, expected: String },

    #[error("period {period}: replacement '{title}' is not in the allowed title list")]
    TitleNotAllowed { period: String, title: String },

    #[error("run {run_index}: untouched run was modified")]
    UntouchedRunChanged { run_index: usize },

    #[error("run count changed from {before} to {after}")]
    RunCountChanged { before: usize, after: usize },

    #[error("run {run_index}: forbidden token '{token}' present after rewrite")]
    ForbiddenToken { run_index: usize, token: String },
}

/// Outcome of validating one rewritten document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub accepted: bool,
    pub violations: Vec<Violation>,
    /// Periods skipped with span-not-found. Warnings, not rejections.
    pub skipped_periods: Vec<String>,
}

/// Validates a rewritten document against the original and the recorded
/// substitution results.
pub fn validate<D: TextDocument>(
    original: &D,
    rewritten: &D,
    results: &[SubstitutionResult],
    pool: &BulletPool,
) -> ValidationReport {
    let mut violations = Vec::new();

    if original.run_count() != rewritten.run_count() {
        violations.push(Violation::RunCountChanged {
            before: original.run_count(),
            after: rewritten.run_count(),
        });
        return ValidationReport {
            accepted: false,
            violations,
            skipped_periods: skipped(results),
        };
    }

    let touched: Vec<usize> = results.iter().filter_map(|r| r.run_index).collect();

    // Untouched runs must be byte-identical.
    for index in 0..original.run_count() {
        if !touched.contains(&index) && original.run_text(index) != rewritten.run_text(index) {
            violations.push(Violation::UntouchedRunChanged { run_index: index });
        }
    }

    for result in results {
        let Some(run_index) = result.run_index else {
            continue; // span not found; reported via skipped_periods
        };
        let before_run = original.run_text(run_index);
        let after_run = rewritten.run_text(run_index);

        // An unchanged outcome means the run carries no edit at all.
        if matches!(result.outcome, Outcome::Unchanged { .. }) && before_run != after_run {
            violations.push(Violation::UntouchedRunChanged { run_index });
        }

        let tabs_before = before_run.matches('\t').count();
        let tabs_after = after_run.matches('\t').count();
        if tabs_before != tabs_after {
            violations.push(Violation::TabCountChanged {
                run_index,
                before: tabs_before,
                after: tabs_after,
            });
        }

        if !before_run.contains("  ") && after_run.contains("  ") {
            violations.push(Violation::DoubleSpaceIntroduced { run_index });
        }

        if let Some(fp) = &result.before {
            if !after_run.contains(fp.date_text.as_str()) {
                violations.push(Violation::DateAltered {
                    run_index,
                    expected: fp.date_text.clone(),
                });
            }
        }

        if let Outcome::Replaced { selected, .. } = &result.outcome {
            let allowed = pool
                .rules_for(&result.period)
                .map(|rule| rule.allows(selected))
                .unwrap_or(false);
            if !allowed {
                violations.push(Violation::TitleNotAllowed {
                    period: result.period.key().to_string(),
                    title: selected.clone(),
                });
            }

            let lowered = after_run.to_lowercase();
            for token in FORBIDDEN_TOKENS {
                if lowered.contains(token) {
                    violations.push(Violation::ForbiddenToken {
                        run_index,
                        token: (*token).to_string(),
                    });
                }
            }
        }
    }

    ValidationReport {
        accepted: violations.is_empty(),
        violations,
        skipped_periods: skipped(results),
    }
}

fn skipped(results: &[SubstitutionResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| r.is_span_not_found())
        .map(|r| r.period.key().to_string())
        .collect()
}
