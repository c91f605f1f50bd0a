//! Structured medication-plan data model
//!
//! The serde field names match the JSON contract of the remote
//! vision-language service, so its responses deserialize directly into
//! these types.

use serde::{Deserialize, Serialize};

/// Placeholder used when a medication name cannot be recovered.
pub const UNKNOWN_MEDICATION: &str = "Unbekanntes Medikament";

/// Default dose unit when none was recognized.
pub const DEFAULT_UNIT: &str = "Stück";

/// Morning/noon/evening/night dose counts, conventionally written as a
/// dash-separated string ("1-0-1-0"). Absent or unparseable values are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DosingScheme {
    #[serde(default)]
    pub morning: f64,
    #[serde(default)]
    pub noon: f64,
    #[serde(default)]
    pub evening: f64,
    #[serde(default)]
    pub night: f64,
}

impl DosingScheme {
    pub fn new(morning: f64, noon: f64, evening: f64, night: f64) -> Self {
        Self {
            morning,
            noon,
            evening,
            night,
        }
    }

    /// True when no dose is taken at any time of day.
    pub fn is_empty(&self) -> bool {
        self.morning == 0.0 && self.noon == 0.0 && self.evening == 0.0 && self.night == 0.0
    }
}

/// One medication row of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    /// 8-digit Pharmazentralnummer, when printed on the plan.
    #[serde(default)]
    pub pzn: Option<String>,
    /// Trade name. Never empty; falls back to [`UNKNOWN_MEDICATION`].
    pub name: String,
    #[serde(default)]
    pub active_ingredient: Option<String>,
    /// Dose form (Tabletten, Tropfen, ...).
    #[serde(default)]
    pub form: Option<String>,
    /// Strength including decimal part, dot decimal separator ("1.5").
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub dosing: DosingScheme,
    /// Raw dosage text as it appeared on the plan. Carries "3 x täglich"
    /// style schedules that do not decompose into per-time-of-day counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_text: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub indication: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for MedicationRecord {
    fn default() -> Self {
        Self {
            pzn: None,
            name: UNKNOWN_MEDICATION.to_string(),
            active_ingredient: None,
            form: None,
            strength: None,
            dosing: DosingScheme::default(),
            dosage_text: None,
            unit: DEFAULT_UNIT.to_string(),
            indication: None,
            notes: None,
        }
    }
}

/// Patient header data. Every field is optional; plans are frequently
/// photographed with the header cut off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text date as printed, usually "TT.MM.JJJJ".
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Issuing doctor, when printed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The canonical structured artifact of a scan session, consumed by all
/// three encoders. Created once per session and discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPlan {
    #[serde(default)]
    pub patient: PatientInfo,
    #[serde(default)]
    pub medications: Vec<MedicationRecord>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub doctor: DoctorInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dosing_scheme_empty() {
        assert!(DosingScheme::default().is_empty());
        assert!(!DosingScheme::new(1.0, 0.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_record_defaults() {
        let record = MedicationRecord::default();
        assert_eq!(record.name, UNKNOWN_MEDICATION);
        assert_eq!(record.unit, DEFAULT_UNIT);
        assert!(record.pzn.is_none());
    }

    #[test]
    fn test_plan_deserializes_remote_contract() {
        // Shape produced by the vision-language service.
        let json = r#"{
            "patient": {
                "name": "Mustermann, Max",
                "birthDate": "01.02.1960",
                "gender": "m",
                "address": "Musterstr. 1, 12345 Berlin"
            },
            "medications": [{
                "pzn": "12345678",
                "name": "Metformin",
                "activeIngredient": "Metformin",
                "form": "Tabletten",
                "strength": "500",
                "dosing": {"morning": 1.0, "noon": 0.0, "evening": 1.0, "night": 0.0},
                "unit": "mg",
                "indication": "Diabetes",
                "notes": null
            }],
            "issueDate": "01.06.2025",
            "doctor": {"name": "Dr. Beispiel", "phone": "030 123456"}
        }"#;

        let plan: MedicationPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.patient.name.as_deref(), Some("Mustermann, Max"));
        assert_eq!(plan.medications.len(), 1);
        assert_eq!(plan.medications[0].dosing.morning, 1.0);
        assert_eq!(plan.doctor.name.as_deref(), Some("Dr. Beispiel"));
    }

    #[test]
    fn test_plan_tolerates_missing_fields() {
        let plan: MedicationPlan = serde_json::from_str(r#"{"medications": []}"#).unwrap();
        assert!(plan.patient.name.is_none());
        assert!(plan.medications.is_empty());
    }
}
