use super::syntax::{BLOCK_TAG, Statement, VAR_TAG, VarRef, normalize_runs, statements};
use crate::docx::xml::{find_elements, find_elements_in, fragment_text};
use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// A template part split into literal XML, placeholders and repeated rows.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPart {
    pub segments: Vec<Segment>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Xml(String),
    Var(VarRef),
    Rows(RowRegion),
}

/// Table rows repeated once per element of `list`, with `var` bound to the element.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RowRegion {
    pub var: String,
    pub list: String,
    /// Zero-based index of the table within the part.
    pub table: usize,
    /// Zero-based index of the first template row within the table.
    pub row: usize,
    /// Number of template rows repeated per element.
    pub rows: usize,
    /// Whether the region was delimited by `{%tr %}` marker rows.
    pub marker: bool,
    /// The captured row XML; contains only `Xml` and `Var` segments.
    pub template: Vec<Segment>,
}

impl RowRegion {
    pub fn describe(&self, part: &str) -> String {
        format!(
            "{} table {} row {} (loop over '{}')",
            part,
            self.table + 1,
            self.row + 1,
            self.list
        )
    }

    /// Field names the row reads from its loop variable, in first-use order.
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for segment in &self.template {
            if let Segment::Var(var) = segment
                && var.root == self.var
                && let Some(field) = &var.field
                && !fields.contains(field)
            {
                fields.push(field.clone());
            }
        }
        fields
    }
}

/// A repeated region found while scanning tables, before segmentation.
struct RegionSpan {
    span: Range<usize>,
    var: String,
    list: String,
    table: usize,
    row: usize,
    rows: usize,
    marker: bool,
    template_xml: String,
}

/// Parses one XML part of a template.
pub fn parse_part(part: &str, xml: &str) -> Result<(String, ParsedPart), TemplateError> {
    let normalized = normalize_runs(xml);
    let spans = find_regions(part, &normalized)?;

    let mut segments = Vec::new();
    let mut last = 0;
    for region in spans {
        split_literal(part, &normalized[last..region.span.start], &mut segments)?;
        let region_name = format!("{} table {} row {}", part, region.table + 1, region.row + 1);
        let mut template = Vec::new();
        split_literal(&region_name, &region.template_xml, &mut template)?;
        debug!(
            "Captured row region over '{}' in {} ({} segments)",
            region.list,
            region_name,
            template.len()
        );
        segments.push(Segment::Rows(RowRegion {
            var: region.var,
            list: region.list,
            table: region.table,
            row: region.row,
            rows: region.rows,
            marker: region.marker,
            template,
        }));
        last = region.span.end;
    }
    split_literal(part, &normalized[last..], &mut segments)?;

    Ok((normalized, ParsedPart { segments }))
}

fn render_error(region: impl Into<String>, message: impl Into<String>) -> TemplateError {
    TemplateError::Render {
        region: region.into(),
        message: message.into(),
    }
}

/// Finds every repeated row region in the top-level tables of a part.
fn find_regions(part: &str, xml: &str) -> Result<Vec<RegionSpan>, TemplateError> {
    let mut regions = Vec::new();
    for (table_index, table) in find_elements(xml, "w:tbl").into_iter().enumerate() {
        let rows = find_elements_in(xml, table, "w:tr");
        let mut open: Option<(usize, String, String)> = None;

        for (row_index, row) in rows.iter().enumerate() {
            let location = || format!("{} table {} row {}", part, table_index + 1, row_index + 1);
            let row_statements = statements(&fragment_text(&xml[row.clone()]));
            if row_statements.is_empty() {
                continue;
            }

            let marker = row_statements.iter().find(|s| {
                matches!(
                    s,
                    Statement::For { row_marker: true, .. } | Statement::EndFor { row_marker: true }
                )
            });

            match (marker, open.clone()) {
                (Some(Statement::For { var, list, .. }), None) => {
                    open = Some((row_index, var.clone(), list.clone()));
                }
                (Some(Statement::For { .. }), Some(_)) => {
                    return Err(render_error(location(), "nested row loops are not supported"));
                }
                (Some(Statement::EndFor { .. }), Some((start, var, list))) => {
                    if start + 1 == row_index {
                        return Err(render_error(location(), "row loop has no template rows"));
                    }
                    let template_xml = rows[start + 1..row_index]
                        .iter()
                        .map(|r| &xml[r.clone()])
                        .collect::<String>();
                    regions.push(RegionSpan {
                        span: rows[start].start..row.end,
                        var,
                        list,
                        table: table_index,
                        row: start + 1,
                        rows: row_index - start - 1,
                        marker: true,
                        template_xml,
                    });
                    open = None;
                }
                (Some(Statement::EndFor { .. }), None) => {
                    return Err(render_error(
                        location(),
                        "'{%tr endfor %}' without a matching '{%tr for %}'",
                    ));
                }
                (None, Some(_)) => {
                    return Err(render_error(
                        location(),
                        "loop tags are not allowed inside a row loop",
                    ));
                }
                (None, None) => {
                    regions.push(inline_region(
                        &xml[row.clone()],
                        &row_statements,
                        row.clone(),
                        table_index,
                        row_index,
                        location,
                    )?);
                }
                (Some(Statement::Unsupported(_)), _) => {}
            }
        }

        if let Some((start, _, list)) = open {
            return Err(render_error(
                format!("{} table {} row {}", part, table_index + 1, start + 1),
                format!("row loop over '{}' is never closed", list),
            ));
        }
    }
    Ok(regions)
}

/// A single row whose cells carry `{% for %}…{% endfor %}` is its own row template.
fn inline_region(
    row_xml: &str,
    row_statements: &[Statement],
    span: Range<usize>,
    table: usize,
    row: usize,
    location: impl Fn() -> String,
) -> Result<RegionSpan, TemplateError> {
    let mut binding: Option<(&str, &str)> = None;
    let mut depth = 0usize;
    for statement in row_statements {
        match statement {
            Statement::For { var, list, .. } => {
                if depth > 0 {
                    return Err(render_error(location(), "nested loops are not supported"));
                }
                match binding {
                    Some((v, l)) if v != var.as_str() || l != list.as_str() => {
                        return Err(render_error(
                            location(),
                            format!("cells loop over different lists ('{}' and '{}')", l, list),
                        ));
                    }
                    _ => binding = Some((var.as_str(), list.as_str())),
                }
                depth += 1;
            }
            Statement::EndFor { .. } => {
                if depth == 0 {
                    return Err(render_error(
                        location(),
                        "'{% endfor %}' without a matching '{% for %}'",
                    ));
                }
                depth -= 1;
            }
            Statement::Unsupported(body) => {
                return Err(render_error(
                    location(),
                    format!("unsupported statement '{{% {} %}}'", body),
                ));
            }
        }
    }
    if depth != 0 {
        return Err(render_error(location(), "'{% for %}' is never closed with '{% endfor %}'"));
    }
    let Some((var, list)) = binding else {
        return Err(render_error(location(), "row contains statements but no loop"));
    };

    Ok(RegionSpan {
        span,
        var: var.to_string(),
        list: list.to_string(),
        table,
        row,
        rows: 1,
        marker: false,
        template_xml: BLOCK_TAG.replace_all(row_xml, "").into_owned(),
    })
}

/// Splits literal XML into `Xml` and `Var` segments.
fn split_literal(region: &str, xml: &str, out: &mut Vec<Segment>) -> Result<(), TemplateError> {
    if let Some(statement) = BLOCK_TAG.find(xml) {
        return Err(render_error(
            region,
            format!(
                "'{}' is only supported inside a table row",
                statement.as_str()
            ),
        ));
    }

    let mut last = 0;
    for caps in VAR_TAG.captures_iter(xml) {
        let whole = caps.get(0).expect("group 0 always matches");
        push_xml(region, &xml[last..whole.start()], out)?;
        out.push(Segment::Var(VarRef::parse(&caps[1])));
        last = whole.end();
    }
    push_xml(region, &xml[last..], out)
}

fn push_xml(region: &str, xml: &str, out: &mut Vec<Segment>) -> Result<(), TemplateError> {
    if xml.is_empty() {
        return Ok(());
    }
    if let Some(at) = xml.find("{{") {
        let excerpt: String = xml[at..].chars().take(40).collect();
        return Err(render_error(
            region,
            format!("unterminated placeholder near '{}'", excerpt),
        ));
    }
    match out.last_mut() {
        Some(Segment::Xml(previous)) => previous.push_str(xml),
        _ => out.push(Segment::Xml(xml.to_string())),
    }
    Ok(())
}
