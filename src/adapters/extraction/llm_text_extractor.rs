//! LLM-backed TextExtractor.
//!
//! Prompts an `AIProvider` and converts its JSON replies into extraction
//! trees. Replies go through `ResponseParser`, which strips code fences and
//! surrounding prose before decoding.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::domain::client::ClientRecord;
use crate::domain::extraction::{ExtractionTree, ResponseParser};
use crate::domain::foundation::Timestamp;
use crate::domain::identity::ExtractedName;
use crate::ports::{
    AIProvider, CompletionRequest, ExtractorConfig, ExtractorError, FullExtraction, MessageRole,
    RequestMetadata, TextExtractor,
};

use super::prompts::{
    full_prompt, name_prompt, truncate_transcript, FULL_SYSTEM_PROMPT, NAME_SYSTEM_PROMPT,
};

/// Name replies are tiny; cap them well below the full budget.
const NAME_MAX_TOKENS: u32 = 200;

pub struct LlmTextExtractor {
    ai_provider: Arc<dyn AIProvider>,
    parser: ResponseParser,
}

impl LlmTextExtractor {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self {
            ai_provider,
            parser: ResponseParser::new(),
        }
    }

    fn request(
        &self,
        operation: &str,
        config: &ExtractorConfig,
        system: &str,
        user: String,
        max_tokens: u32,
    ) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(operation))
            .with_system_prompt(system)
            .with_message(MessageRole::User, user)
            .with_model(config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(max_tokens)
            .with_json_output()
    }
}

#[async_trait]
impl TextExtractor for LlmTextExtractor {
    async fn extract_full(
        &self,
        config: &ExtractorConfig,
        text: &str,
        existing: Option<&ClientRecord>,
    ) -> Result<FullExtraction, ExtractorError> {
        let transcript = truncate_transcript(text, config.max_transcript_chars);
        let request = self.request(
            "extract_full",
            config,
            FULL_SYSTEM_PROMPT,
            full_prompt(transcript, existing),
            config.max_tokens,
        );

        let response = self.ai_provider.complete(request).await?;
        tracing::debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Full extraction reply received"
        );
        let reply = self.parser.parse(&response.content)?;
        full_extraction_from(reply)
    }

    async fn extract_name(
        &self,
        config: &ExtractorConfig,
        text: &str,
    ) -> Result<Option<ExtractedName>, ExtractorError> {
        let transcript = truncate_transcript(text, config.max_transcript_chars);
        let request = self.request(
            "extract_name",
            config,
            NAME_SYSTEM_PROMPT,
            name_prompt(transcript),
            NAME_MAX_TOKENS,
        );

        let response = self.ai_provider.complete(request).await?;
        let reply = self.parser.parse(&response.content)?;
        Ok(name_from(&reply))
    }
}

/// Splits a full reply into tree, summary and missing fields.
///
/// Replies without a `data` wrapper are taken to be the data itself.
fn full_extraction_from(reply: Value) -> Result<FullExtraction, ExtractorError> {
    let Value::Object(mut map) = reply else {
        return Err(ExtractorError::Invalid("reply is not a JSON object".to_string()));
    };

    let summary = map
        .remove("summary")
        .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
        .filter(|s| !s.is_empty());
    let missing_fields = map
        .remove("missingFields")
        .and_then(|v| match v {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default();

    let data = match map.remove("data") {
        Some(data) => data,
        None => Value::Object(std::mem::take(&mut map)),
    };
    let data = match data {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };

    Ok(FullExtraction {
        data: ExtractionTree::from_json(data)?,
        summary,
        missing_fields,
    })
}

fn name_from(reply: &Value) -> Option<ExtractedName> {
    let field = |key: &str| reply.get(key).and_then(Value::as_str).map(str::trim).unwrap_or_default();
    let name = ExtractedName::new(field("firstName"), field("lastName"))
        .with_meeting_date(Timestamp::parse_date(field("meetingDate")));
    name.is_complete().then_some(name)
}
