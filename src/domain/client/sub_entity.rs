//! Default shapes for the array-held sub-entities of a client record.

use serde_json::{json, Value};
use uuid::Uuid;

/// The seven kinds of positional sub-entity a client record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubEntityKind {
    Dependant,
    Pension,
    Property,
    Investment,
    BankAccount,
    Debt,
    Protection,
}

impl SubEntityKind {
    pub const ALL: [SubEntityKind; 7] = [
        SubEntityKind::Dependant,
        SubEntityKind::Pension,
        SubEntityKind::Property,
        SubEntityKind::Investment,
        SubEntityKind::BankAccount,
        SubEntityKind::Debt,
        SubEntityKind::Protection,
    ];

    /// The record field holding the array of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            SubEntityKind::Dependant => "dependants",
            SubEntityKind::Pension => "pensions",
            SubEntityKind::Property => "properties",
            SubEntityKind::Investment => "investments",
            SubEntityKind::BankAccount => "bankAccounts",
            SubEntityKind::Debt => "debts",
            SubEntityKind::Protection => "protection",
        }
    }

    /// Maps a collection field name back to its kind.
    pub fn from_collection(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == name)
    }

    /// A fully-initialised entity with a fresh id.
    ///
    /// Every field is present so completeness scoring and export never
    /// mistake a new slot for a missing one.
    pub fn default_entity(&self) -> Value {
        let id = Uuid::new_v4().to_string();
        match self {
            SubEntityKind::Dependant => json!({
                "id": id,
                "name": "",
                "relationship": "",
                "dateOfBirth": null,
                "financiallyDependent": false,
            }),
            SubEntityKind::Pension => json!({
                "id": id,
                "provider": "",
                "type": "",
                "policyNumber": "",
                "currentValue": 0,
                "monthlyContribution": 0,
                "employerContribution": 0,
            }),
            SubEntityKind::Property => json!({
                "id": id,
                "address": "",
                "type": "",
                "ownership": "",
                "currentValue": 0,
                "purchasePrice": 0,
                "mortgageOutstanding": 0,
            }),
            SubEntityKind::Investment => json!({
                "id": id,
                "provider": "",
                "type": "",
                "currentValue": 0,
                "monthlyContribution": 0,
            }),
            SubEntityKind::BankAccount => json!({
                "id": id,
                "bank": "",
                "type": "",
                "balance": 0,
                "interestRate": 0,
            }),
            SubEntityKind::Debt => json!({
                "id": id,
                "lender": "",
                "type": "",
                "balance": 0,
                "monthlyPayment": 0,
                "interestRate": 0,
            }),
            SubEntityKind::Protection => json!({
                "id": id,
                "provider": "",
                "type": "",
                "coverAmount": 0,
                "monthlyPremium": 0,
                "inTrust": false,
            }),
        }
    }
}
