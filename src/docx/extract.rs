use super::package::Package;
use super::xml::{find_elements, find_elements_in, fragment_text};
use crate::error::TemplateError;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Uploads above this size are accepted but reported.
pub const LARGE_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// A table as rows of cell texts.
pub type TableText = Vec<Vec<String>>;

/// Plain text of every non-empty paragraph in the main document, one per line.
/// Paragraphs inside table cells are included in reading order.
pub fn extract_text(docx: &[u8]) -> Result<String, TemplateError> {
    let document = Package::from_bytes(docx)?.main_document()?;
    Ok(document_text(&document))
}

fn document_text(document: &str) -> String {
    find_elements(document, "w:p")
        .into_iter()
        .map(|range| fragment_text(&document[range]))
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every top-level table of the main document, as rows of cell texts.
///
/// Multi-paragraph cells are joined with `\n`.
pub fn extract_tables(docx: &[u8]) -> Result<Vec<TableText>, TemplateError> {
    let document = Package::from_bytes(docx)?.main_document()?;
    Ok(document_tables(&document))
}

fn document_tables(document: &str) -> Vec<TableText> {
    find_elements(document, "w:tbl")
        .into_iter()
        .map(|table| {
            find_elements_in(document, table, "w:tr")
                .into_iter()
                .map(|row| {
                    find_elements_in(document, row, "w:tc")
                        .into_iter()
                        .map(|cell| cell_text(document, cell))
                        .collect()
                })
                .collect()
        })
        .collect()
}

fn cell_text(document: &str, cell: std::ops::Range<usize>) -> String {
    find_elements_in(document, cell, "w:p")
        .into_iter()
        .map(|p| fragment_text(&document[p]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of checking an uploaded file before it is sent anywhere.
#[derive(Debug, Clone, Default)]
pub struct UploadCheck {
    pub size: u64,
    pub paragraph_count: usize,
    pub table_count: usize,
    pub warnings: Vec<String>,
}

/// Checks that `path` is a readable, non-empty `.docx` package.
pub fn check_upload(path: &Path) -> Result<UploadCheck, TemplateError> {
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(TemplateError::NotFound(shown));
    }
    let is_docx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
    if !is_docx {
        return Err(TemplateError::Malformed(format!(
            "'{}' is not a .docx file",
            shown
        )));
    }

    let size = fs::metadata(path)
        .map_err(|e| TemplateError::Io {
            path: shown.clone(),
            message: e.to_string(),
        })?
        .len();
    if size == 0 {
        return Err(TemplateError::Malformed(format!("'{}' is empty", shown)));
    }

    let mut check = UploadCheck {
        size,
        ..UploadCheck::default()
    };
    if size > LARGE_UPLOAD_BYTES {
        warn!("Upload '{}' is {} bytes", shown, size);
        check
            .warnings
            .push("file is larger than 50 MiB and may be slow to process".to_string());
    }

    let document = Package::open(path)?.main_document()?;
    check.paragraph_count = find_elements(&document, "w:p").len();
    check.table_count = find_elements(&document, "w:tbl").len();
    info!(
        "Upload '{}' accepted: {} paragraphs, {} tables",
        shown, check.paragraph_count, check.table_count
    );
    Ok(check)
}
