//! Integration tests for interactive transcript review.
//!
//! An adviser reviews a transcript against an existing client, sees the
//! conflicts, then approves a subset of fields (some edited) which are
//! merged and stored with provenance.

use serde_json::json;
use std::sync::Arc;

use fact_find::adapters::{InMemoryRecordStore, InMemoryTranscriptStore, LlmTextExtractor, MockAIProvider};
use fact_find::application::{
    ApplyReviewCommand, ApplyReviewHandler, ReconciliationError, ReviewTranscriptCommand, ReviewTranscriptHandler,
};
use fact_find::domain::client::{ClientRecord, SourceType};
use fact_find::domain::foundation::ClientId;
use fact_find::domain::reconciliation::ApprovedField;
use fact_find::ports::{AIError, ExtractorConfig, RecordStore};

fn existing_client() -> ClientRecord {
    ClientRecord::with_fields(
        ClientId::new("amy-brown-0000aaaa").unwrap(),
        json!({
            "personal": {"firstName": "Amy", "lastName": "Brown", "phone": "01234 567890"},
            "pensions": [{"id": "p1", "provider": "Aviva", "currentValue": 20000}]
        })
        .as_object()
        .cloned()
        .unwrap(),
    )
}

#[tokio::test]
async fn review_then_apply_selected_fields() {
    let record = existing_client();
    let records = InMemoryRecordStore::with_records([record.clone()]);
    let transcripts = InMemoryTranscriptStore::new();
    let provider = MockAIProvider::new().with_json_response(json!({
        "data": {
            "personal": {"phone": {"value": "07700 900123", "confidence": 0.7}},
            "employment": {"monthlyGrossIncome": {"value": 4800, "confidence": 0.5}},
            "pensions": [
                {"provider": {"value": "Aviva", "confidence": 0.9}},
                {"provider": {"value": "Nest", "confidence": 0.8},
                 "currentValue": {"value": 12000, "confidence": 0.6}}
            ]
        }
    }));

    let review = ReviewTranscriptHandler::new(
        Arc::new(records.clone()),
        Arc::new(LlmTextExtractor::new(Arc::new(provider))),
        ExtractorConfig::default(),
    )
    .handle(ReviewTranscriptCommand {
        client_id: record.id().clone(),
        transcript: "Amy's new number is 07700 900123. She also has a Nest pension.".into(),
    })
    .await
    .unwrap();

    assert_eq!(review.conflicts.len(), 1);
    assert_eq!(review.conflicts[0].field.to_string(), "personal.phone");
    assert_eq!(review.conflicts[0].existing_value, json!("01234 567890"));

    let approved = vec![
        ApprovedField::accepted(review.conflicts[0].field.clone()),
        ApprovedField::accepted("pensions[1].provider".parse().unwrap()),
        ApprovedField::edited("pensions[1].currentValue".parse().unwrap(), "12500"),
    ];

    let applied = ApplyReviewHandler::new(Arc::new(records.clone()), Arc::new(transcripts.clone()))
        .handle(ApplyReviewCommand {
            client_id: record.id().clone(),
            extraction: review.extraction.data,
            approved,
            file_name: "review.txt".into(),
            transcript: "Amy's new number is 07700 900123.".into(),
        })
        .await
        .unwrap();

    assert_eq!(applied.fields_written, 3);
    assert!(applied.skipped.is_empty());

    let stored = records.get(record.id()).await.unwrap().unwrap();
    assert_eq!(stored.version(), 2);
    assert_eq!(stored.get_str("personal.phone"), Some(&json!("07700 900123")));
    assert_eq!(stored.get_str("pensions[0].provider"), Some(&json!("Aviva")));
    assert_eq!(stored.get_str("pensions[1].provider"), Some(&json!("Nest")));
    assert_eq!(stored.get_str("pensions[1].currentValue"), Some(&json!(12500)));
    // Unapproved fields stay out, whatever their confidence.
    assert!(stored.get_str("employment.monthlyGrossIncome").is_none());

    let source = &stored.data_sources()[0];
    assert_eq!(source.source_type, SourceType::Transcript);
    assert!(source.human_reviewed);
    assert_eq!(source.fields_updated, 3);
    assert_eq!(source.edited_fields, 1);
    assert_eq!(transcripts.for_client(record.id()).await.len(), 1);
}

#[tokio::test]
async fn provider_failure_surfaces_as_extraction_error() {
    let record = existing_client();
    let records = InMemoryRecordStore::with_records([record.clone()]);
    let provider = MockAIProvider::new().with_error(AIError::InvalidRequest("bad prompt".into()));

    let err = ReviewTranscriptHandler::new(
        Arc::new(records),
        Arc::new(LlmTextExtractor::new(Arc::new(provider))),
        ExtractorConfig::default(),
    )
    .handle(ReviewTranscriptCommand {
        client_id: record.id().clone(),
        transcript: "hello".into(),
    })
    .await
    .unwrap_err();

    assert!(matches!(err, ReconciliationError::Extraction(_)));
}
