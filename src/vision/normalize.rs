//! Turns a raw vision reply into an [`AnalysisResult`] plus an audit snapshot.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::response::{reasoning_summary, snapshot, OutputItem, ResponseShape};
use crate::analysis::AnalysisResult;

/// Why a reply produced no analysis
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no text content in vision response")]
    EmptyContent,

    #[error("vision output is not a valid analysis: {source} (content: {preview})")]
    Parse {
        source: serde_json::Error,
        preview: String,
    },
}

/// Outcome of normalizing one reply. The snapshot is always present.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub analysis: Option<AnalysisResult>,
    pub snapshot: Value,
}

pub fn normalize(raw: &Value) -> Normalized {
    let snapshot = snapshot(raw);

    if let Some(summary) = reasoning_summary(raw) {
        let preview: String = summary.chars().take(200).collect();
        info!("Vision reasoning: {preview}...");
    }

    let analysis = match parse_reply(raw) {
        Ok(result) => {
            info!(
                "Vision analysis complete: status={}, score={}",
                result.status, result.score
            );
            if !result.matches_rubric() {
                warn!(
                    "Model qualification disagrees with rubric: status={}, score={}, is_qualified={}",
                    result.status, result.score, result.is_qualified
                );
            }
            Some(result)
        }
        Err(e) => {
            error!("Failed to normalize vision response: {e}");
            None
        }
    };

    Normalized { analysis, snapshot }
}

/// Extract and strictly parse the analysis text from a reply.
pub fn parse_reply(raw: &Value) -> Result<AnalysisResult, NormalizeError> {
    let content = extract_text(raw).ok_or(NormalizeError::EmptyContent)?;
    parse_analysis(&content)
}

/// Parse model output text, tolerating a fenced code block wrapper.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult, NormalizeError> {
    let cleaned = strip_code_fence(content);
    serde_json::from_str(cleaned).map_err(|source| NormalizeError::Parse {
        source,
        preview: cleaned.chars().take(200).collect(),
    })
}

/// Pull the flat text payload out of a reply, in priority order.
///
/// Returns `None` when the extracted text is empty.
pub fn extract_text(raw: &Value) -> Option<String> {
    let text = match ResponseShape::classify(raw) {
        ResponseShape::Output(items) => match text_from_items(&items) {
            Some(text) => text.to_string(),
            None => {
                debug!("No text item in vision output, stringifying response");
                raw.to_string()
            }
        },
        ResponseShape::OutputObject(node) | ResponseShape::Choices(node) => node_text(node),
        ResponseShape::Opaque(value) => value.to_string(),
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn text_from_items<'a>(items: &[OutputItem<'a>]) -> Option<&'a str> {
    let from_message = items.iter().copied().find_map(|item| match item {
        OutputItem::Message { content } => content
            .iter()
            .find_map(|part| part.get("text").and_then(Value::as_str)),
        _ => None,
    });

    from_message.or_else(|| {
        items.iter().copied().find_map(|item| match item {
            OutputItem::OutputText { text } | OutputItem::TextBearing { text } => Some(text),
            _ => None,
        })
    })
}

/// Text of a content node; lists are searched one level deeper.
fn node_text(node: &Value) -> String {
    match node {
        Value::String(text) => text.clone(),
        Value::Array(parts) => {
            let items: Vec<OutputItem<'_>> = parts.iter().map(OutputItem::classify).collect();
            text_from_items(&items)
                .map(str::to_string)
                .unwrap_or_else(|| node.to_string())
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Trim whitespace and a surrounding triple-backtick fence (with optional language tag).
pub fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}
