//! Verbose element-per-field XML encoding (format version 027)

use crate::model::MedicationPlan;

use super::escape_xml;
use super::format_dose;

/// Encode a plan as the verbose XML variant.
pub fn encode_bmp27(plan: &MedicationPlan) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<MP xmlns=\"http://ws.gematik.de/fa/amts/AMTS_Document/v1.6\" v=\"027\">\n");

    xml.push_str("  <P>\n");
    if let Some(name) = &plan.patient.name {
        xml.push_str(&format!("    <g>{}</g>\n", escape_xml(name)));
    }
    if let Some(birth) = &plan.patient.birth_date {
        xml.push_str(&format!("    <b>{}</b>\n", escape_xml(birth)));
    }
    if let Some(gender) = &plan.patient.gender {
        xml.push_str(&format!("    <s>{}</s>\n", escape_xml(gender)));
    }
    xml.push_str("  </P>\n");

    if !plan.medications.is_empty() {
        xml.push_str("  <S>\n");
        for (index, med) in plan.medications.iter().enumerate() {
            xml.push_str(&format!("    <M i=\"{}\">\n", index + 1));
            if let Some(pzn) = &med.pzn {
                xml.push_str(&format!("      <p>{}</p>\n", escape_xml(pzn)));
            }
            xml.push_str(&format!("      <a>{}</a>\n", escape_xml(&med.name)));
            if let Some(ingredient) = &med.active_ingredient {
                xml.push_str(&format!("      <w>{}</w>\n", escape_xml(ingredient)));
            }
            if let Some(form) = &med.form {
                xml.push_str(&format!("      <f>{}</f>\n", escape_xml(form)));
            }
            if let Some(strength) = &med.strength {
                xml.push_str(&format!("      <z>{}</z>\n", escape_xml(strength)));
            }
            xml.push_str(&format!(
                "      <d>{}-{}-{}-{}</d>\n",
                format_dose(med.dosing.morning),
                format_dose(med.dosing.noon),
                format_dose(med.dosing.evening),
                format_dose(med.dosing.night)
            ));
            xml.push_str(&format!("      <e>{}</e>\n", escape_xml(&med.unit)));
            if let Some(indication) = &med.indication {
                xml.push_str(&format!("      <r>{}</r>\n", escape_xml(indication)));
            }
            if let Some(notes) = &med.notes {
                xml.push_str(&format!("      <h>{}</h>\n", escape_xml(notes)));
            }
            xml.push_str("    </M>\n");
        }
        xml.push_str("  </S>\n");
    }

    if let Some(issue_date) = &plan.issue_date {
        xml.push_str(&format!("  <A t=\"{}\"/>\n", escape_xml(issue_date)));
    }

    xml.push_str("</MP>");
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
                gender: Some("m".to_string()),
                address: None,
            },
            medications: vec![MedicationRecord {
                pzn: Some("12345678".to_string()),
                name: "Metformin".to_string(),
                strength: Some("500".to_string()),
                dosing: DosingScheme::new(1.0, 0.0, 1.0, 0.0),
                unit: "mg".to_string(),
                ..Default::default()
            }],
            issue_date: Some("01.06.2025".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_structure() {
        let xml = encode_bmp27(&sample_plan());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<MP xmlns=\"http://ws.gematik.de/fa/amts/AMTS_Document/v1.6\" v=\"027\">"));
        assert!(xml.contains("<g>Mustermann, Max</g>"));
        assert!(xml.contains("<M i=\"1\">"));
        assert!(xml.contains("<p>12345678</p>"));
        assert!(xml.contains("<d>1-0-1-0</d>"));
        assert!(xml.contains("<A t=\"01.06.2025\"/>"));
        assert!(xml.ends_with("</MP>"));
    }

    #[test]
    fn test_medication_index_is_one_based() {
        let mut plan = sample_plan();
        plan.medications.push(MedicationRecord {
            name: "Ramipril".to_string(),
            ..Default::default()
        });
        let xml = encode_bmp27(&plan);
        assert!(xml.contains("<M i=\"1\">"));
        assert!(xml.contains("<M i=\"2\">"));
    }

    #[test]
    fn test_name_is_escaped() {
        let mut plan = sample_plan();
        plan.medications[0].name = "A&B <Forte>".to_string();
        let xml = encode_bmp27(&plan);
        assert!(xml.contains("<a>A&amp;B &lt;Forte&gt;</a>"));
        assert!(!xml.contains("A&B"));
    }

    #[test]
    fn test_empty_plan_is_valid() {
        let xml = encode_bmp27(&MedicationPlan::default());
        assert!(xml.contains("<P>\n  </P>"));
        assert!(!xml.contains("<S>"));
        assert!(xml.ends_with("</MP>"));
    }

    #[test]
    fn test_fractional_dosing() {
        let mut plan = sample_plan();
        plan.medications[0].dosing = DosingScheme::new(1.5, 0.0, 0.5, 0.0);
        let xml = encode_bmp27(&plan);
        assert!(xml.contains("<d>1.5-0-0.5-0</d>"));
    }
}
