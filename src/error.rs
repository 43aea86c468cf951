use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Location of a field inside a teaching-design payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldPath {
    /// The payload itself.
    Root,
    /// A top-level field, scalar or list.
    Field(String),
    /// A field of a list element. `field` is `None` when the element itself is at fault.
    Element {
        list: String,
        index: usize,
        field: Option<String>,
    },
}

impl FieldPath {
    pub fn field(name: &str) -> Self {
        FieldPath::Field(name.to_string())
    }

    pub fn element(list: &str, index: usize, field: Option<&str>) -> Self {
        FieldPath::Element {
            list: list.to_string(),
            index,
            field: field.map(str::to_string),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Root => write!(f, "$"),
            FieldPath::Field(name) => write!(f, "{}", name),
            FieldPath::Element {
                list,
                index,
                field: Some(field),
            } => write!(f, "{}[{}].{}", list, index, field),
            FieldPath::Element {
                list,
                index,
                field: None,
            } => write!(f, "{}[{}]", list, index),
        }
    }
}

/// The nature of a single validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldErrorKind {
    #[error("required field is missing")]
    Missing,

    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value must not be empty")]
    Empty,

    #[error(
        "document-level field is no longer accepted; every learning activity carries its own activity_intent"
    )]
    LegacyField,
}

/// A validation failure tied to one field (and, for list elements, one index).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{path}: {kind}")]
pub struct FieldError {
    pub path: FieldPath,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(path: FieldPath, kind: FieldErrorKind) -> Self {
        Self { path, kind }
    }

    /// The list index this error refers to, if any.
    pub fn index(&self) -> Option<usize> {
        match &self.path {
            FieldPath::Element { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The innermost field name this error refers to, if any.
    pub fn field_name(&self) -> Option<&str> {
        match &self.path {
            FieldPath::Root => None,
            FieldPath::Field(name) => Some(name),
            FieldPath::Element { field, .. } => field.as_deref(),
        }
    }
}

/// Every problem found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub(crate) fn push(&mut self, path: FieldPath, kind: FieldErrorKind) {
        self.errors.push(FieldError::new(path, kind));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation error(s): {}",
            self.errors.len(),
            self.errors.iter().join("; ")
        )
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised while turning a model response into a JSON payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Failed to parse payload JSON: {0}")]
    Json(String),

    #[error("Model response does not contain a JSON object")]
    NoJsonObject,

    #[error("Payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Errors that can occur while loading, parsing or rendering a Word template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Could not read template '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Template package is malformed: {0}")]
    Malformed(String),

    #[error("Rendering failed in {region}: {message}")]
    Render { region: String, message: String },

    #[error("Placeholder '{placeholder}' in '{part}' has no bound value")]
    UnboundPlaceholder { placeholder: String, part: String },

    #[error("Could not write output '{path}': {message}")]
    Write { path: String, message: String },
}

/// Errors raised while saving or loading a compiled template artifact.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Artifact serialization failed: {0}")]
    Encode(String),

    #[error("Artifact deserialization failed: {0}")]
    Decode(String),

    #[error("Artifact I/O failed for '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors surfaced by the end-to-end generation contract.
#[derive(Error, Debug, Clone)]
pub enum GenerateError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Payload failed validation: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Template(#[from] TemplateError),
}
