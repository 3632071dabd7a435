//! Format-Preserving Substitution Engine.
//!
//! Rewrites job-title tokens inside a document's text runs based on the
//! bullet-pool rule table, never disturbing anything else in the run: all
//! surrounding whitespace and the date substring are carried byte-for-byte
//! from the original span into the rewritten span.
//!
//! Span location is a small state machine rather than a document-wide
//! regex: seek the literal title, then confirm the adjacent date range
//! matches the period before computing span boundaries. Whitespace-sensitive
//! invariants require this kind of span-local reasoning.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::profile::{CandidateProfile, CareerPeriod, MonthYear, PeriodEnd};
use crate::rewrite::document::TextDocument;
use crate::rules::{BulletPool, RuleError};

// ────────────────────────────────────────────────────────────────────────────
// Result models
// ────────────────────────────────────────────────────────────────────────────

/// Measurable formatting properties of a span's run, captured before and
/// after a rewrite. The validation gate asserts equality of everything
/// except the title text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanFingerprint {
    pub tab_count: usize,
    pub has_double_space: bool,
    /// Raw date substring, e.g. `11/2023 - Present`. Never rewritten.
    pub date_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    /// The rule offers exactly one title — no alternative exists.
    SingleOption,
    /// The current title is already the rank-0 choice.
    AlreadyPreferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Replaced { previous: String, selected: String },
    Unchanged { current: String, reason: UnchangedReason },
    /// The period's title text could not be located — recoverable; the
    /// period is skipped and the rest of the document still processed.
    SpanNotFound,
}

/// Per-period record of what the engine did.
#[derive(Debug, Clone, Serialize)]
pub struct SubstitutionResult {
    pub period: CareerPeriod,
    pub run_index: Option<usize>,
    pub outcome: Outcome,
    pub before: Option<SpanFingerprint>,
    pub after: Option<SpanFingerprint>,
}

impl SubstitutionResult {
    pub fn is_replaced(&self) -> bool {
        matches!(self.outcome, Outcome::Replaced { .. })
    }

    pub fn is_span_not_found(&self) -> bool {
        matches!(self.outcome, Outcome::SpanNotFound)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Span location
// ────────────────────────────────────────────────────────────────────────────

/// Byte boundaries of one located "Title ... (dates)" occurrence.
#[derive(Debug, Clone, Copy)]
struct Span {
    run: usize,
    title_start: usize,
    title_end: usize,
    date_start: usize,
    date_end: usize,
}

fn fingerprint(run: &str, span: &Span) -> SpanFingerprint {
    SpanFingerprint {
        tab_count: run.matches('\t').count(),
        has_double_space: run.contains("  "),
        date_text: run[span.date_start..span.date_end].to_string(),
    }
}

/// Finds the first run containing one of `needles` followed (across
/// whitespace only) by the period's date range.
fn locate_span<D: TextDocument>(document: &D, needles: &[&str], period: &CareerPeriod) -> Option<Span> {
    for run in 0..document.run_count() {
        let text = document.run_text(run);
        for needle in needles {
            let mut from = 0;
            while let Some(offset) = text[from..].find(needle) {
                let title_start = from + offset;
                let title_end = title_start + needle.len();
                if starts_at_boundary(text, title_start) {
                    if let Some((date_start, date_end)) = confirm_date(text, title_end, period) {
                        return Some(Span {
                            run,
                            title_start,
                            title_end,
                            date_start,
                            date_end,
                        });
                    }
                }
                from = title_end;
            }
        }
    }
    None
}

/// A title match must not begin mid-word ("Senior Product Analyst" may
/// still match its "Product Analyst" suffix after the space).
fn starts_at_boundary(text: &str, title_start: usize) -> bool {
    match text[..title_start].chars().next_back() {
        None => true,
        Some(prev) => !prev.is_alphanumeric(),
    }
}

/// State machine continuing from the end of the title literal:
/// whitespace (at least one char) → start date → optional spaced dash →
/// end date or `Present`. Returns the date substring boundaries.
fn confirm_date(text: &str, title_end: usize, period: &CareerPeriod) -> Option<(usize, usize)> {
    let date_start = eat_whitespace(text, title_end);
    if date_start == title_end {
        return None; // title must be separated from the date
    }

    let mut cursor = date_start + match_month(text, date_start, period.start)?;

    cursor = eat_spaces(text, cursor);
    if let Some(dash) = text[cursor..].chars().next() {
        if dash == '-' || dash == '\u{2013}' || dash == '\u{2014}' {
            cursor += dash.len_utf8();
            cursor = eat_spaces(text, cursor);
        }
    }

    let end_len = match period.end {
        PeriodEnd::Present => text[cursor..]
            .starts_with("Present")
            .then_some("Present".len())?,
        PeriodEnd::Month(m) => match_month(text, cursor, m)?,
    };
    let date_end = cursor + end_len;

    // The date must not continue into a longer token ("11/20235").
    match text[date_end..].chars().next() {
        Some(next) if next.is_alphanumeric() => None,
        _ => Some((date_start, date_end)),
    }
}

/// Matches a month/year at `at` in its zero-padded (`08/2022`) or bare
/// (`8/2022`) rendering. Returns the matched length.
fn match_month(text: &str, at: usize, value: MonthYear) -> Option<usize> {
    let padded = value.to_string();
    if text[at..].starts_with(&padded) {
        return Some(padded.len());
    }
    let bare = format!("{}/{}", value.month, value.year);
    if bare != padded && text[at..].starts_with(&bare) {
        return Some(bare.len());
    }
    None
}

fn eat_whitespace(text: &str, mut cursor: usize) -> usize {
    while let Some(c) = text[cursor..].chars().next() {
        if c == ' ' || c == '\t' {
            cursor += c.len_utf8();
        } else {
            break;
        }
    }
    cursor
}

fn eat_spaces(text: &str, mut cursor: usize) -> usize {
    while text[cursor..].starts_with(' ') {
        cursor += 1;
    }
    cursor
}

// ────────────────────────────────────────────────────────────────────────────
// Substitution
// ────────────────────────────────────────────────────────────────────────────

/// Applies bullet-pool title substitution to every career period in the
/// profile.
///
/// A missing rule is fatal (`RuleError::NotFound` — the profile and table
/// disagree). A missing span is not: the period is recorded as
/// `SpanNotFound` and processing continues.
pub fn apply<D: TextDocument>(
    mut document: D,
    profile: &CandidateProfile,
    pool: &BulletPool,
) -> Result<(D, Vec<SubstitutionResult>), RuleError> {
    let mut results = Vec::with_capacity(profile.periods.len());

    for period in &profile.periods {
        let rule = pool.rules_for(period)?;

        // The stored literal is tried first; allowed variants are accepted
        // too so a second pass over an already-rewritten document still
        // finds its spans (idempotence).
        let mut needles: Vec<&str> = vec![period.title.as_str()];
        for title in &rule.titles {
            if !needles.contains(&title.as_str()) {
                needles.push(title);
            }
        }

        let Some(span) = locate_span(&document, &needles, period) else {
            warn!(
                period = %period.key(),
                employer = %period.employer,
                title = %period.title,
                "title span not found in document; period skipped"
            );
            results.push(SubstitutionResult {
                period: period.clone(),
                run_index: None,
                outcome: Outcome::SpanNotFound,
                before: None,
                after: None,
            });
            continue;
        };

        let original_run = document.run_text(span.run).to_string();
        let current_title = original_run[span.title_start..span.title_end].to_string();
        let before = fingerprint(&original_run, &span);

        if rule.titles.len() == 1 {
            debug!(
                period = %period.key(),
                title = %current_title,
                "single-option rule; unchanged by policy"
            );
            results.push(SubstitutionResult {
                period: period.clone(),
                run_index: Some(span.run),
                outcome: Outcome::Unchanged {
                    current: current_title,
                    reason: UnchangedReason::SingleOption,
                },
                after: Some(before.clone()),
                before: Some(before),
            });
            continue;
        }

        let selected = rule.preferred();
        if selected == current_title {
            results.push(SubstitutionResult {
                period: period.clone(),
                run_index: Some(span.run),
                outcome: Outcome::Unchanged {
                    current: current_title,
                    reason: UnchangedReason::AlreadyPreferred,
                },
                after: Some(before.clone()),
                before: Some(before),
            });
            continue;
        }

        // Rewrite only the title bytes; everything around them is copied
        // verbatim from the original run.
        let mut rewritten = String::with_capacity(
            original_run.len() - current_title.len() + selected.len(),
        );
        rewritten.push_str(&original_run[..span.title_start]);
        rewritten.push_str(selected);
        rewritten.push_str(&original_run[span.title_end..]);

        let shift = selected.len() as isize - current_title.len() as isize;
        let after_span = Span {
            run: span.run,
            title_start: span.title_start,
            title_end: span.title_start + selected.len(),
            date_start: (span.date_start as isize + shift) as usize,
            date_end: (span.date_end as isize + shift) as usize,
        };
        let after = fingerprint(&rewritten, &after_span);

        document.set_run_text(span.run, rewritten);
        debug!(
            period = %period.key(),
            from = %current_title,
            to = %selected,
            "title span rewritten"
        );

        results.push(SubstitutionResult {
            period: period.clone(),
            run_index: Some(span.run),
            outcome: Outcome::Replaced {
                previous: current_title,
                selected: selected.to_string(),
            },
            before: Some(before),
            after: Some(after),
        });
    }

    Ok((document, results))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
