//! Medication-specific text corrections
//!
//! A fixed, ordered substitution list tuned to confusions recognition
//! engines commonly make on German medication plans: unit abbreviations,
//! multiplication/dash dosage separators and digit/letter mixups.

use regex::Regex;
use std::sync::LazyLock;

static CORRECTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Dosage separators.
        (Regex::new(r"(\d+)\s*x\s*(\d+)").unwrap(), "$1×$2"),
        (
            Regex::new(r"(\d+)\s*-\s*(\d+)\s*-\s*(\d+)").unwrap(),
            "$1-$2-$3",
        ),
        // Unit abbreviations.
        (Regex::new(r"(?i)\btbl\b").unwrap(), "Tbl."),
        (Regex::new(r"(?i)\bkps\b").unwrap(), "Kps."),
        (Regex::new(r"(?i)\btrpf\b").unwrap(), "Trpf."),
        (Regex::new(r"(?i)\bstk\b").unwrap(), "Stk."),
        // Digit/letter confusions.
        (Regex::new(r"(?i)\brng\b").unwrap(), "mg"),
        (Regex::new(r"(?i)\brn[lg]\b").unwrap(), "ml"),
        (Regex::new(r"\b[il]E\b").unwrap(), "IE"),
    ]
});

/// Apply the substitution list in order to recognized text.
pub fn correct_medication_text(text: &str) -> String {
    let mut processed = text.to_string();
    for (pattern, replacement) in CORRECTIONS.iter() {
        processed = pattern.replace_all(&processed, *replacement).into_owned();
    }
    processed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplication_separator() {
        assert_eq!(correct_medication_text("3 x 1"), "3×1");
    }

    #[test]
    fn test_dash_scheme_whitespace_collapsed() {
        assert_eq!(correct_medication_text("1 - 0 - 1"), "1-0-1");
    }

    #[test]
    fn test_unit_abbreviations() {
        assert_eq!(correct_medication_text("2 tbl morgens"), "2 Tbl. morgens");
        assert_eq!(correct_medication_text("10 stk"), "10 Stk.");
    }

    #[test]
    fn test_digit_letter_confusions() {
        assert_eq!(correct_medication_text("500 rng"), "500 mg");
        assert_eq!(correct_medication_text("20 rnl"), "20 ml");
        assert_eq!(correct_medication_text("1000 lE"), "1000 IE");
        assert_eq!(correct_medication_text("1000 iE"), "1000 IE");
    }

    #[test]
    fn test_clean_text_unchanged() {
        let text = "Metformin 500 mg 1-0-1-0";
        assert_eq!(correct_medication_text(text), text);
    }
}
