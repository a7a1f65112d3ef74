//! Data completeness scoring.
//!
//! A pure function of the record: the same record always scores the same.

use serde_json::Value;

use crate::domain::foundation::Percentage;

use super::record::{is_blank, ClientRecord};

/// A category scored by the fraction of its fields that are filled.
struct FieldGroup {
    section: &'static str,
    fields: &'static [&'static str],
    weight: f64,
}

const FIELD_GROUPS: [FieldGroup; 4] = [
    FieldGroup {
        section: "personal",
        fields: &["firstName", "lastName", "dateOfBirth", "maritalStatus", "email", "phone"],
        weight: 25.0,
    },
    FieldGroup {
        section: "employment",
        fields: &["status", "occupation", "employer", "monthlyGrossIncome"],
        weight: 15.0,
    },
    FieldGroup {
        section: "goals",
        fields: &["retirementAge", "targetRetirementIncome", "shortTermGoals", "longTermGoals"],
        weight: 15.0,
    },
    FieldGroup {
        section: "riskAttitude",
        fields: &["tolerance", "capacityForLoss", "investmentExperience"],
        weight: 10.0,
    },
];

/// Collections that earn their full weight as soon as they hold an entry.
const COLLECTIONS: [(&str, f64); 4] = [
    ("pensions", 10.0),
    ("properties", 10.0),
    ("investments", 5.0),
    ("bankAccounts", 5.0),
];

const EXPENDITURE_WEIGHT: f64 = 5.0;

/// Expenditure scores once more than this many of its amounts are filled.
const EXPENDITURE_MIN_FILLED: usize = 3;

/// Scores how much of the fact-find is populated, 0-100.
pub fn score_completeness(record: &ClientRecord) -> Percentage {
    let fields = record.fields();
    let mut score = 0.0;

    for group in &FIELD_GROUPS {
        let section = fields.get(group.section);
        let filled = group
            .fields
            .iter()
            .filter(|name| {
                section
                    .and_then(|s| s.get(**name))
                    .is_some_and(|v| !is_blank(v))
            })
            .count();
        score += group.weight * filled as f64 / group.fields.len() as f64;
    }

    for (collection, weight) in COLLECTIONS {
        let populated = fields
            .get(collection)
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty());
        if populated {
            score += weight;
        }
    }

    let expenditure_filled = fields
        .get("expenditure")
        .and_then(Value::as_object)
        .map(|amounts| {
            amounts
                .values()
                .filter(|v| v.as_f64().is_some_and(|n| n > 0.0))
                .count()
        })
        .unwrap_or(0);
    if expenditure_filled > EXPENDITURE_MIN_FILLED {
        score += EXPENDITURE_WEIGHT;
    }

    Percentage::from_score(score)
}
