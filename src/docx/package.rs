use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub const MAIN_DOCUMENT: &str = "word/document.xml";

/// One named part of an OOXML package.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

/// The parts of a `.docx` archive, in archive order.
///
/// Writing is deterministic: parts keep their order and every entry gets the
/// same fixed timestamp, so identical content yields identical bytes.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a package from a file. A missing file is [`TemplateError::NotFound`].
    pub fn open(path: &Path) -> Result<Self, TemplateError> {
        let shown = path.display().to_string();
        if !path.exists() {
            return Err(TemplateError::NotFound(shown));
        }
        let bytes = fs::read(path).map_err(|e| TemplateError::Io {
            path: shown,
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Reads a package from the bytes of a `.docx` archive.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| TemplateError::Malformed(format!("not a zip archive: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| {
                    TemplateError::Malformed(format!("unreadable entry {}: {}", index, e))
                })?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data).map_err(|e| {
                TemplateError::Malformed(format!("could not inflate '{}': {}", entry.name(), e))
            })?;
            parts.push(Part {
                name: entry.name().to_string(),
                data,
            });
        }
        Ok(Self { parts })
    }

    /// Adds a part, replacing any existing part with the same name in place.
    pub fn with_part(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.replace_part(name, data);
        self
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn replace_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// A part decoded as UTF-8 XML.
    pub fn xml_part(&self, name: &str) -> Result<String, TemplateError> {
        let data = self
            .part(name)
            .ok_or_else(|| TemplateError::Malformed(format!("missing part '{}'", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| TemplateError::Malformed(format!("part '{}' is not UTF-8: {}", name, e)))
    }

    /// The body of the document (`word/document.xml`).
    pub fn main_document(&self) -> Result<String, TemplateError> {
        self.xml_part(MAIN_DOCUMENT)
    }

    /// Serializes the package into `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for part in &self.parts {
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|e| package_error(&part.name, e))?;
            writer
                .write_all(&part.data)
                .map_err(|e| package_error(&part.name, e))?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| TemplateError::Malformed(format!("could not finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// A minimal package whose body is `body_xml` (the children of `<w:body>`).
    pub fn from_document_body(body_xml: &str) -> Self {
        Self::new()
            .with_part("[Content_Types].xml", CONTENT_TYPES)
            .with_part("_rels/.rels", ROOT_RELS)
            .with_part(MAIN_DOCUMENT, wrap_body(body_xml))
            .with_part("word/_rels/document.xml.rels", DOCUMENT_RELS)
            .with_part("word/styles.xml", STYLES)
    }
}

fn package_error(part: &str, e: impl std::fmt::Display) -> TemplateError {
    TemplateError::Malformed(format!("could not write part '{}': {}", part, e))
}

/// Wraps body content in a `w:document` root with a default A4 section.
pub fn wrap_body(body_xml: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            "<w:body>{}",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        body_xml
    )
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    "</Types>"
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    "</Relationships>"
);

const DOCUMENT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    "</Relationships>"
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/>"#,
    r#"<w:rPr><w:sz w:val="24"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:b/><w:sz w:val="40"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:pPr><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="30"/></w:rPr></w:style>"#,
    r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders>"#,
    r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:left w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
    r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:right w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
    r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
    "</w:tblBorders></w:tblPr></w:style>",
    "</w:styles>"
);
