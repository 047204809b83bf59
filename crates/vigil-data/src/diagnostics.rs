//! Structured diagnostics channel
//!
//! Data-quality and configuration problems never stop a chart from drawing.
//! They are collected here as typed entries, and each one is mirrored to the
//! `tracing` log when it is pushed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How loudly a diagnostic should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// What went wrong, with the facts needed to explain it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Rows dropped because the result cell was missing or not a number
    MissingValuesRemoved { count: usize },

    /// Measures dropped because at least one result was not numeric
    CategoricalMeasuresRemoved { measures: Vec<String> },

    /// Filter configured on a column the data does not have
    FilterColumnMissing { column: String, label: String },

    /// Filter configured on a column with fewer than two levels
    FilterSingleLevel { column: String, label: String },

    /// Grouping configured on a column the data does not have
    GroupColumnMissing { column: String, label: String },

    /// Configured start measure is not among the numeric measures
    StartValueUnavailable { value: String, fallback: Option<String> },

    /// Axis bounds arrived reversed and were swapped
    DomainSwapped { min: f64, max: f64 },

    /// Axis bounds collapsed to a point and were widened
    DomainPadded { value: f64, min: f64, max: f64 },

    /// Control events raised mid-cycle were folded into one follow-up cycle
    EventsCoalesced { count: usize },

    /// Follow-up cycles kept requesting more work and were cut off
    FollowUpLimitReached { limit: usize },

    /// The current measure has no normal-range data
    NoNormalRange { measure: String },
}

impl DiagnosticKind {
    /// Default severity for this kind
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::EventsCoalesced { .. } | DiagnosticKind::NoNormalRange { .. } => {
                Severity::Info
            }
            _ => Severity::Warning,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            DiagnosticKind::MissingValuesRemoved { count } => format!(
                "{} missing or non-numeric result{} {} been removed.",
                count,
                plural(*count),
                have_has(*count)
            ),
            DiagnosticKind::CategoricalMeasuresRemoved { measures } => format!(
                "{} non-numeric endpoint{} {} been removed: {}",
                measures.len(),
                plural(measures.len()),
                have_has(measures.len()),
                measures.join(", ")
            ),
            DiagnosticKind::FilterColumnMissing { label, .. } => format!(
                "The [ {} ] filter has been removed because the variable does not exist.",
                label
            ),
            DiagnosticKind::FilterSingleLevel { label, .. } => format!(
                "The [ {} ] filter has been removed because the variable has only one level.",
                label
            ),
            DiagnosticKind::GroupColumnMissing { label, .. } => format!(
                "The [ {} ] group has been removed because the variable does not exist.",
                label
            ),
            DiagnosticKind::StartValueUnavailable { value, fallback } => match fallback {
                Some(f) => format!(
                    "Start measure [ {} ] is not a numeric measure in the data; showing [ {} ] instead.",
                    value, f
                ),
                None => format!(
                    "Start measure [ {} ] is not a numeric measure in the data.",
                    value
                ),
            },
            DiagnosticKind::DomainSwapped { min, max } => format!(
                "Lower limit exceeded upper limit; limits swapped to [{} - {}].",
                min, max
            ),
            DiagnosticKind::DomainPadded { value, min, max } => format!(
                "Limits collapsed to {}; widened to [{} - {}].",
                value, min, max
            ),
            DiagnosticKind::EventsCoalesced { count } => format!(
                "{} control event{} raised during a draw cycle {} applied in one follow-up cycle.",
                count,
                plural(*count),
                if *count == 1 { "was" } else { "were" }
            ),
            DiagnosticKind::FollowUpLimitReached { limit } => format!(
                "Stopped after {} follow-up draw cycles; remaining control events were dropped.",
                limit
            ),
            DiagnosticKind::NoNormalRange { measure } => {
                format!("No normal range data available for {}.", measure)
            }
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn have_has(n: usize) -> &'static str {
    if n == 1 {
        "has"
    } else {
        "have"
    }
}

/// One entry in the diagnostics channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic with the kind's default severity and message
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            severity: kind.severity(),
            message: kind.message(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collected diagnostics, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn push(&mut self, kind: DiagnosticKind) {
        let diagnostic = Diagnostic::new(kind);
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Info => tracing::debug!("{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    /// Move every entry of another channel into this one
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }

    /// All entries
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Entries at warning level
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Take every entry, leaving the channel empty
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_pluralize() {
        assert_eq!(
            DiagnosticKind::MissingValuesRemoved { count: 1 }.message(),
            "1 missing or non-numeric result has been removed."
        );
        assert_eq!(
            DiagnosticKind::MissingValuesRemoved { count: 5 }.message(),
            "5 missing or non-numeric results have been removed."
        );
        assert_eq!(
            DiagnosticKind::CategoricalMeasuresRemoved {
                measures: vec!["Color".into(), "Clarity".into()]
            }
            .message(),
            "2 non-numeric endpoints have been removed: Color, Clarity"
        );
    }

    #[test]
    fn test_filter_messages() {
        let kind = DiagnosticKind::FilterSingleLevel {
            column: "SITE".into(),
            label: "Site".into(),
        };
        assert_eq!(
            kind.message(),
            "The [ Site ] filter has been removed because the variable has only one level."
        );
        assert_eq!(kind.severity(), Severity::Warning);
    }

    #[test]
    fn test_channel_push_and_drain() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DiagnosticKind::EventsCoalesced { count: 2 });
        diagnostics.push(DiagnosticKind::MissingValuesRemoved { count: 3 });

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.warnings().count(), 1);

        let drained = diagnostics.drain();
        assert_eq!(drained.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_serialize_flattens_kind() {
        let d = Diagnostic::new(DiagnosticKind::MissingValuesRemoved { count: 2 });
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "missing_values_removed");
        assert_eq!(json["count"], 2);
        assert_eq!(json["severity"], "warning");
    }
}
