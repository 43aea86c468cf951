//! Reading and writing Word (`.docx`) packages.

mod extract;
mod package;
pub mod xml;

pub use extract::{
    LARGE_UPLOAD_BYTES, TableText, UploadCheck, check_upload, extract_tables, extract_text,
};
pub use package::{MAIN_DOCUMENT, Package, Part, wrap_body};
