//! Text resolution for heterogeneously shaped upstream fields

use serde_json::Value;

/// Shape of a descriptive field as sent by the upstream API
#[derive(Debug, Clone, PartialEq)]
pub enum FieldText {
    /// Field missing, null, or of a non-text type
    Absent,
    /// Plain string
    Text(String),
    /// List of candidate shapes, scanned in order
    Nested(Vec<FieldText>),
    /// Object carrying labeled sub-fields
    Keyed {
        value: Option<String>,
        label: Option<String>,
        name: Option<String>,
    },
}

impl FieldText {
    /// Resolve to non-empty text, or `None`
    ///
    /// Keyed objects prefer `value`, then `label`, then `name`. Lists return
    /// the first element that resolves.
    pub fn resolve(&self) -> Option<String> {
        match self {
            FieldText::Absent => None,
            FieldText::Text(text) => non_empty(text),
            FieldText::Nested(items) => items.iter().find_map(FieldText::resolve),
            FieldText::Keyed { value, label, name } => [value, label, name]
                .into_iter()
                .flatten()
                .find_map(|text| non_empty(text)),
        }
    }
}

impl From<&Value> for FieldText {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(text) => FieldText::Text(text.clone()),
            Value::Array(items) => FieldText::Nested(items.iter().map(FieldText::from).collect()),
            Value::Object(map) => {
                let sub = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                FieldText::Keyed {
                    value: sub("value"),
                    label: sub("label"),
                    name: sub("name"),
                }
            }
            _ => FieldText::Absent,
        }
    }
}

impl From<Option<&Value>> for FieldText {
    fn from(value: Option<&Value>) -> Self {
        value.map_or(FieldText::Absent, FieldText::from)
    }
}

/// Resolve an optional raw field to text
pub fn extract_text(value: Option<&Value>) -> Option<String> {
    FieldText::from(value).resolve()
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
