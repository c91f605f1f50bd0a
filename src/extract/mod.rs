//! Rule-based medication extraction from recognized text
//!
//! Turns free OCR text into a [`MedicationPlan`] with German plan
//! conventions: a header line per medication ("Metformin 500 mg"), an
//! optional morning-noon-evening-night scheme ("1-0-1-0") on the same or
//! the following line, plus patient and doctor header fields. Lines that
//! match no pattern are skipped, never guessed at.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{DoctorInfo, DosingScheme, MedicationPlan, MedicationRecord, PatientInfo};

// Medication header: name, strength, unit from the fixed whitelist, with
// an optional trailing period.
static MEDICATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(.+?)\s+(\d+(?:[,\.]\d+)?)\s*(mg|ml|g|μg|IE|I\.E\.|Stk|Tbl|Kps|Trpf|Hub|Beutel)\.?",
    )
    .unwrap()
});

// Morning-noon-evening-night counts; the night segment is optional.
static DOSAGE_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+(?:[,\.]\d+)?)\s*[-–]\s*(\d+(?:[,\.]\d+)?)\s*[-–]\s*(\d+(?:[,\.]\d+)?)\s*(?:[-–]\s*(\d+(?:[,\.]\d+)?))?",
    )
    .unwrap()
});

static DAILY_DOSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[,\.]\d+)?)\s*[x×]\s*(?:tägl(?:ich)?|tgl\.?)").unwrap()
});

static WEEKLY_DOSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[,\.]\d+)?)\s*[x×]\s*(?:wöchentl(?:ich)?|wöch\.?|pro\s*Woche)").unwrap()
});

static TIME_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)morgens?|früh|mittags?|abends?|nachts?|zur\s*Nacht|z\.N\.|vorm\.|nachm\.")
        .unwrap()
});

static FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Tablette|Tbl\.|Kapsel|Kps\.|Tropfen|Trpf\.|Injektion|Inj\.|Salbe|Creme|Gel|Spray|Pulver|Granulat",
    )
    .unwrap()
});

static PZN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPZN[\s:.\-]*(\d{8})\b").unwrap());

static PATIENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Name|Patient):\s*(.+)").unwrap());

static BIRTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Geb\.|Geboren|Geburtsdatum):\s*(\d{1,2}\.\d{1,2}\.\d{2,4})").unwrap()
});

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Adresse|Anschrift):\s*(.+)").unwrap());

static DOCTOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Arzt|Ärztin|Praxis):\s*(.+)").unwrap());

static DOCTOR_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Tel\.?|Telefon):\s*([\d\s/()+\-]{5,})").unwrap());

static ISSUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:ausgedruckt\s+am|ausgestellt\s+am|Datum):\s*(\d{1,2}\.\d{1,2}\.\d{2,4})")
        .unwrap()
});

/// Extract a structured plan from recognized text.
pub fn extract_plan(text: &str) -> MedicationPlan {
    let plan = MedicationPlan {
        patient: extract_patient(text),
        medications: extract_medications(text),
        issue_date: capture(&ISSUE_DATE, text),
        doctor: extract_doctor(text),
    };
    debug!(medications = plan.medications.len(), "plan extracted");
    plan
}

/// Extract the medication rows, one per header line.
pub fn extract_medications(text: &str) -> Vec<MedicationRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut medications = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(header) = MEDICATION.captures(line) else {
            continue;
        };

        let mut record = MedicationRecord {
            name: header[1].trim().to_string(),
            strength: Some(header[2].replace(',', ".")),
            unit: header[3].trim_end_matches('.').to_string(),
            ..Default::default()
        };

        // The dosage often wraps onto the next line.
        let mut window = (*line).to_string();
        if let Some(next) = lines.get(i + 1) {
            window.push(' ');
            window.push_str(next);
        }

        if let Some(scheme) = DOSAGE_SCHEME.captures(&window) {
            record.dosage_text = Some(scheme[0].to_string());
            record.dosing = DosingScheme::new(
                parse_count(&scheme[1]),
                parse_count(&scheme[2]),
                parse_count(&scheme[3]),
                scheme.get(4).map_or(0.0, |m| parse_count(m.as_str())),
            );
        } else if let Some(daily) = DAILY_DOSAGE.find(&window) {
            record.dosage_text = Some(daily.as_str().to_string());
        } else if let Some(weekly) = WEEKLY_DOSAGE.find(&window) {
            record.dosage_text = Some(weekly.as_str().to_string());
        }

        // Form only from the header line itself, not the dosage window.
        if let Some(form) = FORM.find(line) {
            record.form = Some(form.as_str().to_string());
        }

        if let Some(time) = TIME_SPEC.find(&window) {
            record.notes = Some(time.as_str().to_string());
        }

        if let Some(pzn) = PZN.captures(&window) {
            record.pzn = Some(pzn[1].to_string());
        }

        medications.push(record);
    }
    medications
}

fn extract_patient(text: &str) -> PatientInfo {
    PatientInfo {
        name: capture(&PATIENT_NAME, text),
        birth_date: capture(&BIRTH_DATE, text),
        gender: None,
        address: capture(&ADDRESS, text),
    }
}

fn extract_doctor(text: &str) -> DoctorInfo {
    DoctorInfo {
        name: capture(&DOCTOR_NAME, text),
        phone: capture(&DOCTOR_PHONE, text),
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_count(raw: &str) -> f64 {
    raw.replace(',', ".").parse().unwrap_or(0.0)
}
