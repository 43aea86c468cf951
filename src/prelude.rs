//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the jiaoan crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use jiaoan::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let processor = TemplateProcessor::open("templates/teaching_design.docx")?;
//! let payload: serde_json::Value = serde_json::from_str(&std::fs::read_to_string("payload.json")?)?;
//!
//! let document = generate(&payload, &processor)?;
//! document.write_to("outputs/lesson.docx")?;
//! # Ok(())
//! # }
//! ```

// Validation
pub use crate::schema::{ActivityInfo, ReflectionPoint, TeachingDesignData, validate};

// Templates
pub use crate::template::{
    BindingTable, CompiledTemplate, RenderReport, RenderedDocument, TemplateInfo,
    TemplateProcessor, default_template,
};

// Prompting and orchestration
pub use crate::pipeline::{generate, generate_from_response, unique_output_name};
pub use crate::prompt::{extract_payload, generation_prompt};

// Error types
pub use crate::error::{
    FieldError, FieldErrorKind, FieldPath, GenerateError, PayloadError, TemplateError,
    ValidationErrors,
};

pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
