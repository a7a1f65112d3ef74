//! Prompt text for the LLM transcript extractor.

use crate::domain::client::ClientRecord;

pub(crate) const NAME_SYSTEM_PROMPT: &str = r#"You identify the client in financial-advice meeting transcripts.

Reply with a single JSON object and nothing else:
{"firstName": "...", "lastName": "...", "meetingDate": "YYYY-MM-DD" or null}

The client is the person receiving advice, never the adviser. If no client
is named, reply with null."#;

pub(crate) const FULL_SYSTEM_PROMPT: &str = r#"You extract fact-find data from financial-advice meeting transcripts.

Reply with a single JSON object and nothing else:
{
  "data": { ...fields... },
  "summary": "two or three sentence summary of the meeting",
  "missingFields": ["personal.dateOfBirth", ...]
}

Every extracted field in "data" must be an object of the form
{"value": <string | number | boolean | null>, "confidence": <0.0 to 1.0>}.
Use confidence 0.9 or above only for facts stated explicitly, 0.6 to 0.9 for
facts strongly implied, and below 0.6 for guesses. Use a null value when the
transcript says the fact is unknown. Leave out fields the transcript never
mentions and list the important ones in "missingFields".

Sections of "data":
- personal: firstName, lastName, dateOfBirth (YYYY-MM-DD), maritalStatus,
  email, phone, address, nationalInsuranceNumber
- employment: status, occupation, employer, monthlyGrossIncome, monthlyNetIncome
- goals: retirementAge, targetRetirementIncome, shortTermGoals, longTermGoals
- riskAttitude: tolerance, capacityForLoss, investmentExperience
- expenditure: housing, utilities, food, transport, insurance, leisure, other
  (monthly amounts)
- estatePlanning: hasWill, powerOfAttorney, notes

Arrays, one object per item, each item's fields annotated as above:
- dependants: name, dateOfBirth, relationship, financiallyDependent
- pensions: provider, type, policyNumber, currentValue, monthlyContribution, employerContribution
- properties: address, type, currentValue, mortgageBalance, monthlyPayment
- investments: provider, type, currentValue, monthlyContribution
- bankAccounts: provider, type, balance, interestRate
- debts: lender, type, balance, monthlyPayment, interestRate
- protection: provider, type, coverAmount, monthlyPremium

Money amounts are plain numbers without currency symbols."#;

/// User message for the name-only call.
pub(crate) fn name_prompt(transcript: &str) -> String {
    format!("Transcript:\n\n{}", transcript)
}

/// User message for the full extraction call.
pub(crate) fn full_prompt(transcript: &str, existing: Option<&ClientRecord>) -> String {
    match existing.filter(|r| !r.fields().is_empty()) {
        Some(record) => format!(
            "Data already on file for this client (for context; extract only what the transcript says):\n{}\n\nTranscript:\n\n{}",
            serde_json::Value::Object(record.fields().clone()),
            transcript
        ),
        None => format!("Transcript:\n\n{}", transcript),
    }
}

/// Cuts a transcript to at most `max_chars` characters.
pub(crate) fn truncate_transcript(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}
