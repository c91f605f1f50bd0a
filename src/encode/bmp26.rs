//! Compact attribute-based XML encoding (format version 026)
//!
//! Every field is an attribute and whitespace is omitted entirely; this is
//! the variant sized for QR codes. The document carries a fresh dashless
//! UUID and the generation timestamp of the issuer element.

use chrono::Utc;
use uuid::Uuid;

use crate::model::MedicationPlan;

use super::{escape_xml, format_birth_date, format_dose, split_name};

/// Issuer name written into the `<A>` element.
const ISSUER: &str = "medplan-scan";

/// Encode a plan as the compact attribute XML variant.
pub fn encode_bmp26(plan: &MedicationPlan) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    let mut xml = format!("<MP v=\"026\" U=\"{uuid}\" l=\"de-DE\">");

    match &plan.patient.name {
        Some(name) => {
            let (given, family) = split_name(name);
            xml.push_str("<P");
            if !given.is_empty() {
                xml.push_str(&format!(" g=\"{}\"", escape_xml(&given)));
            }
            xml.push_str(&format!(" f=\"{}\"", escape_xml(&family)));
            if let Some(birth) = plan
                .patient
                .birth_date
                .as_deref()
                .and_then(format_birth_date)
            {
                xml.push_str(&format!(" b=\"{birth}\""));
            }
            xml.push_str("/>");
        }
        None => xml.push_str("<P f=\"\"/>"),
    }

    let timestamp = Utc::now().format("%Y-%m-%d %H:%M");
    xml.push_str(&format!("<A n=\"{ISSUER}\" t=\"{timestamp}\"/>"));

    xml.push_str("<S>");
    for med in &plan.medications {
        xml.push_str("<M");
        if let Some(pzn) = &med.pzn {
            xml.push_str(&format!(" p=\"{}\"", escape_xml(pzn)));
        }
        let trade_name = if med.name.is_empty() {
            med.active_ingredient.as_deref().unwrap_or("")
        } else {
            &med.name
        };
        xml.push_str(&format!(" a=\"{}\"", escape_xml(trade_name)));
        if let Some(ingredient) = &med.active_ingredient {
            if *ingredient != med.name {
                xml.push_str(&format!(" w=\"{}\"", escape_xml(ingredient)));
            }
        }
        if let Some(strength) = &med.strength {
            xml.push_str(&format!(" s=\"{}\"", escape_xml(strength)));
        }
        if let Some(form) = &med.form {
            xml.push_str(&format!(" fd=\"{}\"", escape_xml(form)));
        }
        // Zero doses are omitted, not written as "0".
        for (attr, count) in [
            ("m", med.dosing.morning),
            ("d", med.dosing.noon),
            ("v", med.dosing.evening),
            ("h", med.dosing.night),
        ] {
            if count > 0.0 {
                xml.push_str(&format!(" {attr}=\"{}\"", format_dose(count)));
            }
        }
        if !med.unit.is_empty() {
            xml.push_str(&format!(" du=\"{}\"", escape_xml(&med.unit)));
        }
        if let Some(notes) = &med.notes {
            xml.push_str(&format!(" i=\"{}\"", escape_xml(notes)));
        }
        if let Some(indication) = &med.indication {
            xml.push_str(&format!(" r=\"{}\"", escape_xml(indication)));
        }
        xml.push_str("/>");
    }
    xml.push_str("</S></MP>");

    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DosingScheme, MedicationRecord, PatientInfo};

    fn sample_plan() -> MedicationPlan {
        MedicationPlan {
            patient: PatientInfo {
                name: Some("Mustermann, Max".to_string()),
                birth_date: Some("01.02.1960".to_string()),
                ..Default::default()
            },
            medications: vec![MedicationRecord {
                pzn: Some("12345678".to_string()),
                name: "Metformin".to_string(),
                strength: Some("500".to_string()),
                dosing: DosingScheme::new(1.0, 0.0, 1.0, 0.0),
                unit: "mg".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_structure() {
        let xml = encode_bmp26(&sample_plan());
        assert!(xml.starts_with("<MP v=\"026\" U=\""));
        assert!(xml.contains("l=\"de-DE\""));
        assert!(xml.contains("<P g=\"Max\" f=\"Mustermann\" b=\"1960-02-01\"/>"));
        assert!(xml.contains("<A n=\"medplan-scan\" t=\""));
        assert!(xml.contains("p=\"12345678\""));
        assert!(xml.contains("a=\"Metformin\""));
        assert!(xml.ends_with("</S></MP>"));
    }

    #[test]
    fn test_uuid_is_dashless_hex() {
        let xml = encode_bmp26(&MedicationPlan::default());
        let start = xml.find("U=\"").unwrap() + 3;
        let uuid = &xml[start..start + 32];
        assert_eq!(uuid.len(), 32);
        assert!(uuid.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!uuid.contains('-'));
    }

    #[test]
    fn test_zero_doses_omitted() {
        let xml = encode_bmp26(&sample_plan());
        assert!(xml.contains(" m=\"1\""));
        assert!(xml.contains(" v=\"1\""));
        assert!(!xml.contains(" d=\"0\""));
        assert!(!xml.contains(" h=\"0\""));
    }

    #[test]
    fn test_ingredient_matching_name_omitted() {
        let mut plan = sample_plan();
        plan.medications[0].active_ingredient = Some("Metformin".to_string());
        let xml = encode_bmp26(&plan);
        assert!(!xml.contains(" w=\""));

        plan.medications[0].active_ingredient = Some("Metformin HCl".to_string());
        let xml = encode_bmp26(&plan);
        assert!(xml.contains(" w=\"Metformin HCl\""));
    }

    #[test]
    fn test_unknown_patient_writes_empty_family_name() {
        let xml = encode_bmp26(&MedicationPlan::default());
        assert!(xml.contains("<P f=\"\"/>"));
    }

    #[test]
    fn test_escaping_in_attributes() {
        let mut plan = sample_plan();
        plan.medications[0].name = "A&B \"Forte\"".to_string();
        let xml = encode_bmp26(&plan);
        assert!(xml.contains("a=\"A&amp;B &quot;Forte&quot;\""));
    }

    #[test]
    fn test_empty_plan_is_valid() {
        let xml = encode_bmp26(&MedicationPlan::default());
        assert!(xml.contains("<S></S>"));
        assert!(xml.ends_with("</MP>"));
    }
}
