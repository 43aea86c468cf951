use super::artifact::CompiledTemplate;
use super::binding::{BindingCheck, BindingTable};
use super::context::TemplateContext;
use super::inspect::TemplateInfo;
use super::render::{PartRenderer, RenderReport};
use crate::docx::Package;
use crate::error::TemplateError;
use crate::schema::TeachingDesignData;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Where a template comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Compiled(CompiledTemplate),
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::Path(path)
    }
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        TemplateSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for TemplateSource {
    fn from(bytes: Vec<u8>) -> Self {
        TemplateSource::Bytes(bytes)
    }
}

impl From<CompiledTemplate> for TemplateSource {
    fn from(template: CompiledTemplate) -> Self {
        TemplateSource::Compiled(template)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessorConfig {
    /// Treat placeholders without a value as errors instead of rendering them empty.
    pub strict: bool,
    pub bindings: BindingTable,
}

pub struct TemplateProcessorBuilder {
    source: TemplateSource,
    config: ProcessorConfig,
}

impl TemplateProcessorBuilder {
    pub fn new(source: TemplateSource) -> Self {
        Self {
            source,
            config: ProcessorConfig::default(),
        }
    }

    pub fn with_binding_table(mut self, bindings: BindingTable) -> Self {
        self.config.bindings = bindings;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads and parses the template.
    pub fn build(self) -> Result<TemplateProcessor, TemplateError> {
        let template = match self.source {
            TemplateSource::Path(path) => {
                let template = CompiledTemplate::compile(Package::open(&path)?)?;
                info!("Loaded template '{}'", path.display());
                template
            }
            TemplateSource::Bytes(bytes) => CompiledTemplate::from_docx(&bytes)?,
            TemplateSource::Compiled(template) => template,
        };
        Ok(TemplateProcessor {
            template,
            config: self.config,
        })
    }
}

/// Renders validated teaching designs into one template.
///
/// The template is parsed once; every [`render`](Self::render) call is
/// independent and leaves the processor untouched, so one processor can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct TemplateProcessor {
    template: CompiledTemplate,
    config: ProcessorConfig,
}

impl TemplateProcessor {
    pub fn builder(source: impl Into<TemplateSource>) -> TemplateProcessorBuilder {
        TemplateProcessorBuilder::new(source.into())
    }

    /// Shorthand for a permissive processor over a template file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        Self::builder(path.as_ref()).build()
    }

    pub fn info(&self) -> &TemplateInfo {
        &self.template.info
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn compiled(&self) -> &CompiledTemplate {
        &self.template
    }

    /// Checks the binding table against the placeholders the template declares.
    pub fn check_bindings(&self) -> BindingCheck {
        self.config.bindings.check(&self.template.info)
    }

    pub fn render(&self, data: &TeachingDesignData) -> Result<RenderedDocument, TemplateError> {
        let context = self.config.bindings.context_for(data);
        let document = self.render_context(&context)?;
        info!(
            "Rendered '{}' with {} activity row(s)",
            data.lesson_name(),
            document.report.rows_for(crate::schema::ACTIVITIES_KEY)
        );
        Ok(document)
    }

    /// Renders an arbitrary context, bypassing the binding table.
    pub fn render_context(
        &self,
        context: &TemplateContext,
    ) -> Result<RenderedDocument, TemplateError> {
        let mut package = self.template.package.clone();
        let mut report = RenderReport::default();

        for part in &self.template.parts {
            let renderer = PartRenderer {
                part: &part.name,
                context,
                strict: self.config.strict,
            };
            let xml = renderer.render(&part.template, &mut report)?;
            package.replace_part(&part.name, xml.into_bytes());
        }

        Ok(RenderedDocument {
            bytes: package.to_bytes()?,
            report,
        })
    }
}

/// A rendered `.docx`, held in memory until written.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
    report: RenderReport,
}

impl RenderedDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn report(&self) -> &RenderReport {
        &self.report
    }

    /// Writes the document to `path` through a temporary file in the same
    /// directory, so `path` either holds the complete document or is untouched.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), TemplateError> {
        let path = path.as_ref();
        let write_error = |e: &dyn std::fmt::Display| TemplateError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| write_error(&e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| write_error(&e))?;
        file.write_all(&self.bytes).map_err(|e| write_error(&e))?;
        file.as_file().sync_all().map_err(|e| write_error(&e))?;
        file.persist(path).map_err(|e| write_error(&e.error))?;

        info!("Wrote {} bytes to '{}'", self.bytes.len(), path.display());
        Ok(())
    }
}
