//! Known shapes of a vision API reply.
//!
//! Replies come back as JSON whose layout depends on which endpoint and
//! model answered. [`ResponseShape::classify`] sorts a reply into one of the
//! recognized layouts; anything else is [`ResponseShape::Opaque`].

use serde_json::{Map, Value};

/// Nodes nested deeper than this are stored as their compact JSON text.
pub const MAX_SNAPSHOT_DEPTH: usize = 32;

/// One element of a responses-style `output` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputItem<'a> {
    /// `type: "message"` with a list of content parts
    Message { content: &'a [Value] },
    /// `type: "output_text"`
    OutputText { text: &'a str },
    /// Any other item that carries a `text` string
    TextBearing { text: &'a str },
    /// Reasoning traces, tool calls and anything else
    Other,
}

impl<'a> OutputItem<'a> {
    pub(crate) fn classify(item: &'a Value) -> Self {
        let kind = item.get("type").and_then(Value::as_str);
        let text = item.get("text").and_then(Value::as_str);

        match (kind, item.get("content")) {
            (Some("message"), Some(Value::Array(content))) => Self::Message { content },
            _ => match (kind, text) {
                (Some("output_text"), Some(text)) => Self::OutputText { text },
                (_, Some(text)) => Self::TextBearing { text },
                _ => Self::Other,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape<'a> {
    /// Responses API: `output` is a list of typed items
    Output(Vec<OutputItem<'a>>),
    /// `output` is a single node carrying `content` or `text` (or is a bare string)
    OutputObject(&'a Value),
    /// Chat completions: `choices[0].message.content`
    Choices(&'a Value),
    /// Nothing recognized
    Opaque(&'a Value),
}

impl<'a> ResponseShape<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        if let Some(output) = raw.get("output") {
            match output {
                Value::Array(items) => {
                    return Self::Output(items.iter().map(OutputItem::classify).collect());
                }
                Value::String(_) => return Self::OutputObject(output),
                Value::Object(obj) => {
                    if let Some(node) = obj.get("content").or_else(|| obj.get("text")) {
                        return Self::OutputObject(node);
                    }
                }
                _ => {}
            }
        }

        if let Some(content) = raw
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
        {
            return Self::Choices(content);
        }

        Self::Opaque(raw)
    }
}

/// First `summary[].text` of a `reasoning` output item, if the reply has one.
pub fn reasoning_summary(raw: &Value) -> Option<&str> {
    raw.get("output")?
        .as_array()?
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("reasoning"))
        .find_map(|item| {
            item.get("summary")?
                .as_array()?
                .first()?
                .get("text")?
                .as_str()
        })
}

/// Plain-data copy of a reply for audit logging.
///
/// Keys with a leading underscore are treated as internal and dropped.
/// Nesting beyond [`MAX_SNAPSHOT_DEPTH`] is collapsed to a JSON string.
pub fn snapshot(raw: &Value) -> Value {
    snapshot_node(raw, 0)
}

fn snapshot_node(node: &Value, depth: usize) -> Value {
    if depth >= MAX_SNAPSHOT_DEPTH && (node.is_array() || node.is_object()) {
        return Value::String(node.to_string());
    }

    match node {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| snapshot_node(item, depth + 1))
                .collect(),
        ),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, value)| (key.clone(), snapshot_node(value, depth + 1)))
                .collect::<Map<String, Value>>(),
        ),
        scalar => scalar.clone(),
    }
}
