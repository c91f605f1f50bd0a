//! Medication-plan encoders
//!
//! Three independent serializers over the same [`MedicationPlan`](crate::model::MedicationPlan):
//! the verbose element-per-field XML variant, the compact attribute XML
//! variant and the delimited flat string used for QR payloads. All three
//! accept a plan with zero medications.

pub mod bmp26;
pub mod bmp27;
pub mod bmp30;

pub use bmp26::encode_bmp26;
pub use bmp27::encode_bmp27;
pub use bmp30::encode_bmp30;

use chrono::NaiveDate;

/// Escape text for embedding in XML attribute or element content.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a dose count the way plans print it: integral counts without a
/// decimal part, fractional counts with one.
pub(crate) fn format_dose(count: f64) -> String {
    format!("{count}")
}

/// Split a recognized patient name into (given, family).
///
/// "Nachname, Vorname" splits at the comma; otherwise the last
/// whitespace-separated token is taken as the family name.
pub(crate) fn split_name(name: &str) -> (String, String) {
    if let Some((family, given)) = name.split_once(',') {
        return (given.trim().to_string(), family.trim().to_string());
    }
    let mut parts: Vec<&str> = name.split_whitespace().collect();
    match parts.len() {
        0 => (String::new(), String::new()),
        1 => (String::new(), parts[0].to_string()),
        _ => {
            let family = parts.pop().unwrap_or_default().to_string();
            (parts.join(" "), family)
        }
    }
}

/// Normalize a free-text birth date to ISO `YYYY-MM-DD`. Returns None for
/// anything that does not parse, which drops the attribute rather than
/// emitting garbage.
pub(crate) fn format_birth_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    for fmt in ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"A&B <"C"> 'D'"#),
            "A&amp;B &lt;&quot;C&quot;&gt; &apos;D&apos;"
        );
        assert_eq!(escape_xml("Metformin"), "Metformin");
    }

    #[test]
    fn test_format_dose() {
        assert_eq!(format_dose(0.0), "0");
        assert_eq!(format_dose(1.0), "1");
        assert_eq!(format_dose(1.5), "1.5");
        assert_eq!(format_dose(0.5), "0.5");
    }

    #[test]
    fn test_split_name_comma_format() {
        assert_eq!(
            split_name("Mustermann, Max"),
            ("Max".to_string(), "Mustermann".to_string())
        );
    }

    #[test]
    fn test_split_name_space_format() {
        assert_eq!(
            split_name("Max Peter Mustermann"),
            ("Max Peter".to_string(), "Mustermann".to_string())
        );
        assert_eq!(split_name("Mustermann"), (String::new(), "Mustermann".to_string()));
    }

    #[test]
    fn test_format_birth_date() {
        assert_eq!(format_birth_date("01.02.1960").as_deref(), Some("1960-02-01"));
        assert_eq!(format_birth_date("1.2.1960").as_deref(), Some("1960-02-01"));
        assert_eq!(format_birth_date("1960-02-01").as_deref(), Some("1960-02-01"));
        assert_eq!(format_birth_date("01/02/1960").as_deref(), Some("1960-02-01"));
        assert_eq!(format_birth_date("unleserlich"), None);
    }
}
