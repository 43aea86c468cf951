use super::fields::{LEGACY_ACTIVITY_INTENT, LIST_FIELDS, ListSpec, SCALAR_FIELDS};
use super::model::{ActivityInfo, DataParts, ReflectionPoint, TeachingDesignData};
use crate::error::{FieldErrorKind, FieldPath, ValidationErrors};
use ahash::AHashMap;
use serde_json::{Map, Value};
use tracing::debug;

/// Validates a raw JSON payload against the current teaching-design schema.
///
/// All problems are collected before returning, so a single call reports every
/// missing or mistyped field. A document-level `activity_intent` (the previous
/// schema revision) is rejected, never migrated.
pub fn validate(payload: &Value) -> Result<TeachingDesignData, ValidationErrors> {
    let Some(object) = payload.as_object() else {
        let mut errors = ValidationErrors::default();
        errors.push(
            FieldPath::Root,
            FieldErrorKind::WrongType {
                expected: "object",
                found: value_kind(payload),
            },
        );
        return Err(errors);
    };

    let mut validator = Validator::new(object);
    let mut parts = DataParts::default();

    for spec in SCALAR_FIELDS {
        if let Some(value) = validator.scalar(spec.key) {
            parts.scalars.insert(spec.key, value);
        }
    }

    if object.contains_key(LEGACY_ACTIVITY_INTENT) {
        validator.errors.push(
            FieldPath::field(LEGACY_ACTIVITY_INTENT),
            FieldErrorKind::LegacyField,
        );
    }

    for spec in LIST_FIELDS {
        let records = validator.records(spec);
        match spec.key {
            super::ACTIVITIES_KEY => {
                parts.activities = records
                    .into_iter()
                    .map(|mut r| ActivityInfo {
                        name: r.remove("name").unwrap_or_default(),
                        teacher_activity: r.remove("teacher_activity").unwrap_or_default(),
                        student_activity: r.remove("student_activity").unwrap_or_default(),
                        activity_intent: r.remove("activity_intent").unwrap_or_default(),
                    })
                    .collect();
            }
            super::REFLECTIONS_KEY => {
                parts.reflections = records
                    .into_iter()
                    .map(|mut r| ReflectionPoint {
                        point_type: r.remove("point_type").unwrap_or_default(),
                        description: r.remove("description").unwrap_or_default(),
                    })
                    .collect();
            }
            _ => {}
        }
    }

    validator.log_unknown_keys();

    if validator.errors.is_empty() {
        Ok(parts.finish())
    } else {
        debug!("Payload rejected with {} error(s)", validator.errors.len());
        Err(validator.errors)
    }
}

impl TryFrom<&Value> for TeachingDesignData {
    type Error = ValidationErrors;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        validate(value)
    }
}

/// Accumulates errors while walking one payload object.
struct Validator<'a> {
    object: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            errors: ValidationErrors::default(),
        }
    }

    fn scalar(&mut self, key: &str) -> Option<String> {
        match self.object.get(key) {
            None => {
                self.errors.push(FieldPath::field(key), FieldErrorKind::Missing);
                None
            }
            Some(value) => match coerce_text(value) {
                Some(text) => Some(text),
                None => {
                    self.errors.push(
                        FieldPath::field(key),
                        FieldErrorKind::WrongType {
                            expected: "string",
                            found: value_kind(value),
                        },
                    );
                    None
                }
            },
        }
    }

    /// Checks a list-of-records field, returning the records that passed.
    fn records(&mut self, spec: &ListSpec) -> Vec<AHashMap<&'static str, String>> {
        let items = match self.object.get(spec.key) {
            None => {
                self.errors
                    .push(FieldPath::field(spec.key), FieldErrorKind::Missing);
                return Vec::new();
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.errors.push(
                    FieldPath::field(spec.key),
                    FieldErrorKind::WrongType {
                        expected: "array",
                        found: value_kind(other),
                    },
                );
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Some(element) = item.as_object() else {
                self.errors.push(
                    FieldPath::element(spec.key, index, None),
                    FieldErrorKind::WrongType {
                        expected: "object",
                        found: value_kind(item),
                    },
                );
                continue;
            };

            let mut record = AHashMap::with_capacity(spec.item_fields.len());
            let mut complete = true;
            for field in spec.item_fields {
                let path = || FieldPath::element(spec.key, index, Some(field.key));
                match element.get(field.key) {
                    None => {
                        self.errors.push(path(), FieldErrorKind::Missing);
                        complete = false;
                    }
                    Some(value) => match coerce_text(value) {
                        None => {
                            self.errors.push(
                                path(),
                                FieldErrorKind::WrongType {
                                    expected: "string",
                                    found: value_kind(value),
                                },
                            );
                            complete = false;
                        }
                        Some(text) if spec.require_non_empty && text.trim().is_empty() => {
                            self.errors.push(path(), FieldErrorKind::Empty);
                            complete = false;
                        }
                        Some(text) => {
                            record.insert(field.key, text);
                        }
                    },
                }
            }
            if complete {
                records.push(record);
            }
        }
        records
    }

    fn log_unknown_keys(&self) {
        for key in self.object.keys() {
            let known = SCALAR_FIELDS.iter().any(|f| f.key == key)
                || LIST_FIELDS.iter().any(|l| l.key == key)
                || key == LEGACY_ACTIVITY_INTENT;
            if !known {
                debug!("Ignoring unknown payload key '{}'", key);
            }
        }
    }
}

/// Accepts strings as-is and stringifies numbers and booleans.
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
