use super::context::{Record, TemplateContext};
use super::parse::{ParsedPart, RowRegion, Segment};
use super::syntax::VarRef;
use crate::docx::xml::run_text;
use crate::error::TemplateError;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// A placeholder that had no value and was rendered empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingOptionalFieldWarning {
    pub placeholder: String,
    pub part: String,
}

impl fmt::Display for MissingOptionalFieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "placeholder '{}' in '{}' has no value; rendered empty",
            self.placeholder, self.part
        )
    }
}

/// Rows emitted for one repeated region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionRows {
    pub list: String,
    pub part: String,
    pub table: usize,
    pub count: usize,
}

/// What happened during one render, besides the output itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub warnings: Vec<MissingOptionalFieldWarning>,
    pub rows: Vec<RegionRows>,
}

impl RenderReport {
    /// Rows emitted for `list`, summed over every region that iterates it.
    pub fn rows_for(&self, list: &str) -> usize {
        self.rows
            .iter()
            .filter(|r| r.list == list)
            .map(|r| r.count)
            .sum()
    }
}

/// Renders one part. Every row of a region is produced from the captured row
/// template and its own record only.
pub(crate) struct PartRenderer<'a> {
    pub part: &'a str,
    pub context: &'a TemplateContext,
    pub strict: bool,
}

impl PartRenderer<'_> {
    pub fn render(
        &self,
        parsed: &ParsedPart,
        report: &mut RenderReport,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &parsed.segments {
            match segment {
                Segment::Xml(xml) => out.push_str(xml),
                Segment::Var(var) => self.scalar(var, &mut out, report)?,
                Segment::Rows(region) => self.rows(region, &mut out, report)?,
            }
        }
        Ok(out)
    }

    fn scalar(
        &self,
        var: &VarRef,
        out: &mut String,
        report: &mut RenderReport,
    ) -> Result<(), TemplateError> {
        match (self.context.text(&var.root), &var.field) {
            (Some(value), None) => {
                out.push_str(&run_text(value));
                Ok(())
            }
            _ => self.missing(&var.to_string(), report),
        }
    }

    fn rows(
        &self,
        region: &RowRegion,
        out: &mut String,
        report: &mut RenderReport,
    ) -> Result<(), TemplateError> {
        let records: &[Record] = match self.context.records(&region.list) {
            Some(records) => records,
            None => {
                self.missing(&region.list, report)?;
                &[]
            }
        };

        for record in records {
            for segment in &region.template {
                match segment {
                    Segment::Xml(xml) => out.push_str(xml),
                    Segment::Var(var) if var.root == region.var => {
                        match var.field.as_deref().and_then(|f| record.get(f)) {
                            Some(value) => out.push_str(&run_text(value)),
                            None => self.missing(&var.to_string(), report)?,
                        }
                    }
                    Segment::Var(var) => self.scalar(var, out, report)?,
                    Segment::Rows(_) => {
                        return Err(TemplateError::Render {
                            region: region.describe(self.part),
                            message: "nested row loops are not supported".to_string(),
                        });
                    }
                }
            }
        }

        debug!(
            "Expanded {} into {} row(s)",
            region.describe(self.part),
            records.len()
        );
        report.rows.push(RegionRows {
            list: region.list.clone(),
            part: self.part.to_string(),
            table: region.table,
            count: records.len(),
        });
        Ok(())
    }

    fn missing(&self, placeholder: &str, report: &mut RenderReport) -> Result<(), TemplateError> {
        if self.strict {
            return Err(TemplateError::UnboundPlaceholder {
                placeholder: placeholder.to_string(),
                part: self.part.to_string(),
            });
        }
        let warning = MissingOptionalFieldWarning {
            placeholder: placeholder.to_string(),
            part: self.part.to_string(),
        };
        if !report.warnings.contains(&warning) {
            warn!("{}", warning);
            report.warnings.push(warning);
        }
        Ok(())
    }
}
