use super::inspect::{TemplateInfo, inspect_part};
use super::parse::{ParsedPart, parse_part};
use crate::docx::xml::find_elements;
use crate::docx::{MAIN_DOCUMENT, Package};
use crate::error::{ArtifactError, TemplateError};
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// A parsed template part.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompiledPart {
    pub name: String,
    pub template: ParsedPart,
}

/// A template package parsed once, ready to be rendered any number of times.
///
/// Can be stored with [`CompiledTemplate::save`] and shipped in place of the
/// `.docx` file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    pub package: Package,
    pub parts: Vec<CompiledPart>,
    pub info: TemplateInfo,
}

/// Parts that may carry markup: the body, then headers and footers.
fn template_parts(package: &Package) -> Vec<String> {
    let mut names: Vec<String> = package
        .part_names()
        .filter(|name| is_header_or_footer(name))
        .map(str::to_string)
        .collect();
    names.sort();
    names.insert(0, MAIN_DOCUMENT.to_string());
    names
}

fn is_header_or_footer(name: &str) -> bool {
    name.strip_prefix("word/")
        .is_some_and(|rest| {
            (rest.starts_with("header") || rest.starts_with("footer"))
                && rest.ends_with(".xml")
                && !rest.contains('/')
        })
}

impl CompiledTemplate {
    pub fn compile(package: Package) -> Result<Self, TemplateError> {
        let mut info = TemplateInfo::default();
        let mut parts = Vec::new();

        for name in template_parts(&package) {
            let xml = package.xml_part(&name)?;
            let (normalized, template) = parse_part(&name, &xml)?;
            inspect_part(&name, &normalized, &template, &mut info);
            if name == MAIN_DOCUMENT {
                info.paragraph_count = find_elements(&normalized, "w:p").len();
                info.table_count = find_elements(&normalized, "w:tbl").len();
            }
            debug!("Parsed template part '{}' ({} segments)", name, template.segments.len());
            parts.push(CompiledPart { name, template });
        }

        Ok(Self {
            package,
            parts,
            info,
        })
    }

    pub fn from_docx(bytes: &[u8]) -> Result<Self, TemplateError> {
        Self::compile(Package::from_bytes(bytes)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(template, _)| template) // bincode 2 returns (value, bytes_read)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }

    /// Saves the compiled template to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads a compiled template from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}
