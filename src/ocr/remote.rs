//! Remote vision-language recognition
//!
//! Sends the normalized plan image to an Ollama-compatible generate
//! endpoint with a German extraction prompt and recovers a structured
//! [`MedicationPlan`] from the model's answer. Models wrap JSON in prose
//! often enough that the parser cuts the response down to the outermost
//! brace pair before deserializing.

use std::io::Cursor;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::RemoteSettings;
use crate::error::ScanError;
use crate::model::{
    DoctorInfo, DosingScheme, MedicationPlan, MedicationRecord, PatientInfo, DEFAULT_UNIT,
    UNKNOWN_MEDICATION,
};

const EXTRACTION_PROMPT: &str = r#"Du bist ein Experte für deutsche Bundesmedikationspläne. Analysiere das Bild eines Medikationsplans und extrahiere alle Informationen.

WICHTIG: Antworte NUR mit einem validen JSON-Objekt, keine zusätzlichen Erklärungen!

Das JSON muss folgende Struktur haben:
{
  "patient": {
    "name": "Nachname, Vorname",
    "birthDate": "TT.MM.JJJJ",
    "gender": "m/w/d",
    "address": "Straße, PLZ Ort"
  },
  "medications": [
    {
      "pzn": "8-stellige Nummer oder null",
      "name": "Medikamentenname",
      "activeIngredient": "Wirkstoff",
      "form": "Darreichungsform (z.B. Tabletten, Tropfen)",
      "strength": "Stärke mit Einheit (z.B. 100mg, 50ml)",
      "dosing": {
        "morning": "Anzahl oder 0",
        "noon": "Anzahl oder 0",
        "evening": "Anzahl oder 0",
        "night": "Anzahl oder 0"
      },
      "unit": "Einheit (z.B. Stück, ml)",
      "indication": "Anwendungsgrund",
      "notes": "Zusätzliche Hinweise"
    }
  ],
  "issueDate": "TT.MM.JJJJ",
  "doctor": {
    "name": "Name des Arztes",
    "phone": "Telefonnummer"
  }
}

Wenn ein Feld nicht lesbar oder nicht vorhanden ist, verwende null.
Bei der Dosierung: Verwende 0 für nicht einzunehmende Zeiten."#;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for the vision-language recognition path.
pub struct RemoteVisionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl RemoteVisionClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    /// Upload the image and return the structured plan the model extracted.
    pub async fn recognize_plan(&self, image: &GrayImage) -> Result<MedicationPlan, ScanError> {
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let encoded = BASE64.encode(&png);

        info!(model = %self.model, bytes = png.len(), "sending image to remote recognizer");

        let request = GenerateRequest {
            model: &self.model,
            prompt: EXTRACTION_PROMPT,
            images: vec![encoded],
            stream: false,
            options: GenerateOptions {
                temperature: 0.1,
                top_p: 0.9,
                num_predict: 2048,
            },
        };

        let response: GenerateResponse = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(chars = response.response.len(), "remote response received");
        parse_plan_response(&response.response)
    }
}

/// Recover a plan from raw model output.
pub fn parse_plan_response(text: &str) -> Result<MedicationPlan, ScanError> {
    let json = extract_json(text)
        .ok_or_else(|| ScanError::RemoteResponse("no JSON object in response".to_string()))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ScanError::RemoteResponse(e.to_string()))?;
    Ok(clean_plan(&value))
}

/// Cut the text down to the outermost brace pair.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Normalize a loosely-typed model answer into the plan model. Missing
/// fields become None, medication names and units get their placeholders
/// and dose counts accept both numbers and numeric strings.
fn clean_plan(value: &Value) -> MedicationPlan {
    let patient = &value["patient"];
    let doctor = &value["doctor"];

    let medications = value["medications"]
        .as_array()
        .map(|meds| meds.iter().map(clean_medication).collect())
        .unwrap_or_default();

    MedicationPlan {
        patient: PatientInfo {
            name: string_field(&patient["name"]),
            birth_date: string_field(&patient["birthDate"]),
            gender: string_field(&patient["gender"]),
            address: string_field(&patient["address"]),
        },
        medications,
        issue_date: string_field(&value["issueDate"]),
        doctor: DoctorInfo {
            name: string_field(&doctor["name"]),
            phone: string_field(&doctor["phone"]),
        },
    }
}

fn clean_medication(med: &Value) -> MedicationRecord {
    let dosing = &med["dosing"];
    MedicationRecord {
        pzn: string_field(&med["pzn"]),
        name: string_field(&med["name"]).unwrap_or_else(|| UNKNOWN_MEDICATION.to_string()),
        active_ingredient: string_field(&med["activeIngredient"]),
        form: string_field(&med["form"]),
        strength: string_field(&med["strength"]),
        dosing: DosingScheme::new(
            dose_field(&dosing["morning"]),
            dose_field(&dosing["noon"]),
            dose_field(&dosing["evening"]),
            dose_field(&dosing["night"]),
        ),
        dosage_text: None,
        unit: string_field(&med["unit"]).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        indication: string_field(&med["indication"]),
        notes: string_field(&med["notes"]),
    }
}

fn string_field(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Dose counts arrive as numbers or numeric strings, comma decimals
/// included. Anything else is 0.
fn dose_field(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_strips_prose() {
        let text = "Hier ist das Ergebnis:\n{\"a\": 1}\nViel Erfolg!";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_none_without_braces() {
        assert_eq!(extract_json("keine Daten gefunden"), None);
    }

    #[test]
    fn test_parse_full_response() {
        let text = r#"{
            "patient": {"name": "Mustermann, Max", "birthDate": "01.02.1960",
                        "gender": "m", "address": "Musterstr. 1, 12345 Berlin"},
            "medications": [{
                "pzn": "12345678", "name": "Ramipril",
                "activeIngredient": "Ramipril", "form": "Tabletten",
                "strength": "5mg",
                "dosing": {"morning": "1", "noon": 0, "evening": "0,5", "night": null},
                "unit": "Stück", "indication": "Blutdruck", "notes": null
            }],
            "issueDate": "01.06.2025",
            "doctor": {"name": "Dr. Beispiel", "phone": "030 123456"}
        }"#;

        let plan = parse_plan_response(text).unwrap();
        assert_eq!(plan.patient.name.as_deref(), Some("Mustermann, Max"));
        let med = &plan.medications[0];
        assert_eq!(med.name, "Ramipril");
        assert_eq!(med.dosing.morning, 1.0);
        assert_eq!(med.dosing.evening, 0.5);
        assert_eq!(med.dosing.night, 0.0);
        assert!(med.notes.is_none());
    }

    #[test]
    fn test_missing_name_gets_placeholder() {
        let text = r#"{"medications": [{"dosing": {}}]}"#;
        let plan = parse_plan_response(text).unwrap();
        assert_eq!(plan.medications[0].name, UNKNOWN_MEDICATION);
        assert_eq!(plan.medications[0].unit, DEFAULT_UNIT);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            parse_plan_response("{not json}"),
            Err(ScanError::RemoteResponse(_))
        ));
    }

    #[test]
    fn test_prompt_requests_json_only() {
        assert!(EXTRACTION_PROMPT.contains("NUR mit einem validen JSON-Objekt"));
    }
}
