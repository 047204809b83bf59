//! Population annotation
//!
//! Reports how many of the participants present in the raw data are still
//! shown after filtering.

use serde::{Deserialize, Serialize};
use std::fmt;

use vigil_data::{count_distinct, RecordRef};

/// `"<shown> of <total> <unit>(s) shown (<pct>%)"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationAnnotation {
    pub shown: usize,
    pub total: usize,
    pub unit: String,
    /// Percentage shown, 0 when the total is 0
    pub percent: f64,
    pub text: String,
}

impl PopulationAnnotation {
    pub fn new(shown: usize, total: usize, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        let percent = if total == 0 {
            0.0
        } else {
            shown as f64 / total as f64 * 100.0
        };
        let text = format!("{} of {} {}(s) shown ({:.1}%)", shown, total, unit, percent);
        Self {
            shown,
            total,
            unit,
            percent,
            text,
        }
    }

    /// Count distinct participants in the derived data
    pub fn from_records(
        derived: &[RecordRef],
        id_col: &str,
        population_count: usize,
        unit: &str,
    ) -> Self {
        Self::new(count_distinct(derived, id_col), population_count, unit)
    }
}

impl Default for PopulationAnnotation {
    fn default() -> Self {
        Self::new(0, 0, "participant")
    }
}

impl fmt::Display for PopulationAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vigil_data::Record;

    #[test]
    fn test_annotation_text() {
        let a = PopulationAnnotation::new(3, 4, "participant");
        assert_eq!(a.text, "3 of 4 participant(s) shown (75.0%)");
        assert_eq!(a.to_string(), a.text);
    }

    #[test]
    fn test_zero_total() {
        let a = PopulationAnnotation::new(0, 0, "subject");
        assert_eq!(a.percent, 0.0);
        assert_eq!(a.text, "0 of 0 subject(s) shown (0.0%)");
    }

    #[test]
    fn test_from_records_counts_distinct() {
        let derived: Vec<RecordRef> = ["01", "01", "02"]
            .iter()
            .map(|id| Arc::new(Record::new().with("USUBJID", *id)))
            .collect();
        let a = PopulationAnnotation::from_records(&derived, "USUBJID", 8, "participant");
        assert_eq!(a.shown, 2);
        assert_eq!(a.text, "2 of 8 participant(s) shown (25.0%)");
    }
}
