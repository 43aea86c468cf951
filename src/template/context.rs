use ahash::AHashMap;
use serde::Serialize;
use serde_json::Value;

/// One list element as seen by a row template.
pub type Record = AHashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContextValue {
    Text(String),
    Records(Vec<Record>),
}

/// The name → value mapping a template is rendered against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    values: AHashMap<String, ContextValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(name.into(), ContextValue::Text(value.into()));
    }

    pub fn insert_records(&mut self, name: impl Into<String>, records: Vec<Record>) {
        self.values
            .insert(name.into(), ContextValue::Records(records));
    }

    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ContextValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn records(&self, name: &str) -> Option<&[Record]> {
        match self.values.get(name) {
            Some(ContextValue::Records(records)) => Some(records),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Renders learning objectives given as a JSON array into a numbered list.
///
/// Every element keeps its position: object elements contribute their
/// `objective` key, `null` leaves its number with empty text and other values
/// print as JSON. Text that is not a JSON array is returned unchanged.
pub fn format_learning_objectives(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with('[') {
        return raw.to_string();
    }
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) else {
        return raw.to_string();
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => map
                .get("objective")
                .map_or_else(|| item.to_string(), objective_text),
            other => objective_text(other),
        })
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn objective_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
