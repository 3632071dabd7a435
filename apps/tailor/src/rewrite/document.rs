//! Document store abstraction.
//!
//! The core never touches file formats. It only needs three operations —
//! enumerate text runs, read a run, replace a run — so any structured
//! document backend (DOCX paragraphs, plain text lines, test fixtures) can
//! sit behind this trait.

/// Read/write access to an ordered sequence of text runs.
pub trait TextDocument {
    fn run_count(&self) -> usize;

    /// Text of the run at `index`. Panics on out-of-range, like slice
    /// indexing; callers iterate `0..run_count()`.
    fn run_text(&self, index: usize) -> &str;

    fn set_run_text(&mut self, index: usize, text: String);
}

/// Line-oriented document: one text run per line. This is the backend the
/// CLI uses and what the engine tests run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextDocument {
    runs: Vec<String>,
    trailing_newline: bool,
}

impl PlainTextDocument {
    pub fn from_text(text: &str) -> Self {
        PlainTextDocument {
            runs: text.lines().map(str::to_string).collect(),
            trailing_newline: text.ends_with('\n'),
        }
    }

    /// Reassembles the document, preserving the presence or absence of a
    /// trailing newline.
    pub fn as_text(&self) -> String {
        let mut text = self.runs.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }
}

impl TextDocument for PlainTextDocument {
    fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn run_text(&self, index: usize) -> &str {
        &self.runs[index]
    }

    fn set_run_text(&mut self, index: usize, text: String) {
        self.runs[index] = text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_bytes() {
        let text = "Name\n\nProduct Analyst\t11/2023 - Present\nbullet one\n";
        let doc = PlainTextDocument::from_text(text);
        assert_eq!(doc.run_count(), 4);
        assert_eq!(doc.run_text(2), "Product Analyst\t11/2023 - Present");
        assert_eq!(doc.as_text(), text);
    }

    #[test]
    fn test_round_trip_without_trailing_newline() {
        let text = "only line";
        let doc = PlainTextDocument::from_text(text);
        assert_eq!(doc.as_text(), text);
    }

    #[test]
    fn test_set_run_text_replaces_only_that_run() {
        let mut doc = PlainTextDocument::from_text("a\nb\nc\n");
        doc.set_run_text(1, "B".to_string());
        assert_eq!(doc.as_text(), "a\nB\nc\n");
    }
}
