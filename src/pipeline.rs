//! The request/response contract offered to an orchestration layer:
//! payload in, validated data bound into a template, rendered document out.

use crate::error::GenerateError;
use crate::prompt::extract_payload;
use crate::schema::{TeachingDesignData, validate};
use crate::template::{RenderedDocument, TemplateProcessor};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

static OUTPUT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Validates a parsed payload and renders it.
///
/// Nothing is rendered unless the payload is valid; all validation errors are
/// returned together.
pub fn generate(
    payload: &Value,
    processor: &TemplateProcessor,
) -> Result<RenderedDocument, GenerateError> {
    let data = validate(payload).inspect_err(|errors| {
        warn!("Payload rejected with {} validation error(s)", errors.len());
    })?;
    render_validated(&data, processor)
}

/// Extracts the JSON payload from a raw model response, then behaves as [`generate`].
pub fn generate_from_response(
    response: &str,
    processor: &TemplateProcessor,
) -> Result<RenderedDocument, GenerateError> {
    let payload = extract_payload(response)?;
    generate(&payload, processor)
}

fn render_validated(
    data: &TeachingDesignData,
    processor: &TemplateProcessor,
) -> Result<RenderedDocument, GenerateError> {
    let document = processor.render(data)?;
    for warning in &document.report().warnings {
        info!("Render note: {}", warning);
    }
    Ok(document)
}

/// A per-request output file name, `教学设计_<stem>_<nanos>_<n>.docx`.
///
/// The stem is reduced to letters, digits, `-` and `_`; the timestamp and a
/// process-wide counter keep concurrent requests from colliding.
pub fn unique_output_name(stem: &str) -> String {
    let sanitized: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .take(64)
        .collect();
    let sanitized = if sanitized.is_empty() {
        "lesson".to_string()
    } else {
        sanitized
    };
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let n = OUTPUT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("教学设计_{}_{}_{}.docx", sanitized, nanos, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_are_unique_and_sanitized() {
        let a = unique_output_name("春/天 的课");
        let b = unique_output_name("春/天 的课");
        assert_ne!(a, b);
        assert!(a.starts_with("教学设计_春天的课_"));
        assert!(a.ends_with(".docx"));
        assert!(unique_output_name("../").starts_with("教学设计_lesson_"));
    }
}
