//! Delimited flat-string encoding (format version 030)
//!
//! The QR payload variant: `mp$v030$` followed by the comma-joined patient
//! field group and one comma-joined field group per medication, groups
//! separated by `$`. Field values are written verbatim; the format defines
//! no escaping for embedded `$` or `,` characters.

use crate::model::MedicationPlan;

use super::format_dose;

/// Encode a plan as the delimited flat string.
pub fn encode_bmp30(plan: &MedicationPlan) -> String {
    let mut out = String::from("mp$v030$");

    // 8 fixed patient positions; street/zip/city/country are never
    // recovered separately from a scan and stay empty.
    let patient = [
        plan.patient.name.as_deref().unwrap_or(""),
        plan.patient.birth_date.as_deref().unwrap_or(""),
        plan.patient.gender.as_deref().unwrap_or(""),
        "",
        "",
        "",
        "",
        plan.patient.address.as_deref().unwrap_or(""),
    ];
    out.push_str(&patient.join(","));
    out.push('$');

    let groups: Vec<String> = plan
        .medications
        .iter()
        .map(|med| {
            [
                med.pzn.as_deref().unwrap_or("").to_string(),
                med.name.clone(),
                med.active_ingredient.clone().unwrap_or_default(),
                med.form.clone().unwrap_or_default(),
                med.strength.clone().unwrap_or_default(),
                format_dose(med.dosing.morning),
                format_dose(med.dosing.noon),
                format_dose(med.dosing.evening),
                format_dose(med.dosing.night),
                med.unit.clone(),
                med.indication.clone().unwrap_or_default(),
                med.notes.clone().unwrap_or_default(),
            ]
            .join(",")
        })
        .collect();
    out.push_str(&groups.join("$"));

    out
}
