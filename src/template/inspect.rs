use super::parse::{ParsedPart, Segment};
use super::syntax::VAR_TAG;
use crate::docx::xml::{find_elements, find_elements_in, fragment_text};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Where a placeholder sits inside a template part. Indices are zero-based.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Paragraph { index: usize },
    TableCell { table: usize, row: usize, cell: usize },
    LoopRow { list: String, table: usize, row: usize, cell: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Paragraph { index } => write!(f, "paragraph {}", index + 1),
            Location::TableCell { table, row, cell } => {
                write!(f, "table {} row {} cell {}", table + 1, row + 1, cell + 1)
            }
            Location::LoopRow {
                list,
                table,
                row,
                cell,
            } => write!(
                f,
                "table {} row {} cell {} (repeated for '{}')",
                table + 1,
                row + 1,
                cell + 1,
                list
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderInfo {
    /// The expression between the braces, e.g. `lesson_name` or `a.name`.
    pub name: String,
    pub part: String,
    pub location: Location,
}

impl PlaceholderInfo {
    pub fn in_loop(&self) -> bool {
        matches!(self.location, Location::LoopRow { .. })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub list: String,
    pub var: String,
    pub part: String,
    pub table: usize,
    pub row: usize,
    pub rows: usize,
    /// Fields read from the loop variable, in first-use order.
    pub fields: Vec<String>,
}

/// The placeholder and region inventory of a template.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateInfo {
    pub placeholders: Vec<PlaceholderInfo>,
    pub regions: Vec<RegionInfo>,
    /// Paragraphs in the main document, table cells included.
    pub paragraph_count: usize,
    /// Top-level tables in the main document.
    pub table_count: usize,
}

impl TemplateInfo {
    /// Distinct placeholder names outside repeated rows, in document order.
    pub fn scalar_placeholders(&self) -> Vec<&str> {
        let mut seen = AHashSet::new();
        self.placeholders
            .iter()
            .filter(|p| !p.in_loop())
            .map(|p| p.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders.iter().any(|p| p.name == name)
    }

    pub fn region(&self, list: &str) -> Option<&RegionInfo> {
        self.regions.iter().find(|r| r.list == list)
    }

    /// Checks placeholder names for authoring mistakes.
    pub fn lint(&self) -> TemplateLint {
        let mut lint = TemplateLint::default();
        let mut seen: AHashSet<&str> = AHashSet::new();

        for placeholder in &self.placeholders {
            let at = format!("{} {}", placeholder.part, placeholder.location);
            if placeholder.name.trim().is_empty() {
                lint.errors.push(format!("empty placeholder at {}", at));
                continue;
            }
            if !placeholder.name.split('.').all(is_identifier) {
                lint.warnings.push(format!(
                    "placeholder '{}' at {} is not a plain identifier",
                    placeholder.name, at
                ));
            }
            if !placeholder.in_loop() && !seen.insert(placeholder.name.as_str()) {
                lint.warnings.push(format!(
                    "placeholder '{}' is used more than once (again at {})",
                    placeholder.name, at
                ));
            }
        }

        for region in &self.regions {
            if region.fields.is_empty() {
                lint.warnings.push(format!(
                    "loop over '{}' in {} table {} never reads '{}'",
                    region.list,
                    region.part,
                    region.table + 1,
                    region.var
                ));
            }
        }
        lint
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLint {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TemplateLint {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Table coordinates of every cell in the top-level tables of `xml`.
struct CellMap {
    cells: Vec<(Range<usize>, usize, usize, usize)>,
}

impl CellMap {
    fn new(xml: &str) -> Self {
        let mut cells = Vec::new();
        for (t, table) in find_elements(xml, "w:tbl").into_iter().enumerate() {
            for (r, row) in find_elements_in(xml, table, "w:tr").into_iter().enumerate() {
                for (c, cell) in find_elements_in(xml, row, "w:tc").into_iter().enumerate() {
                    cells.push((cell, t, r, c));
                }
            }
        }
        Self { cells }
    }

    fn locate(&self, offset: usize) -> Option<(usize, usize, usize)> {
        self.cells
            .iter()
            .find(|(range, ..)| range.contains(&offset))
            .map(|&(_, t, r, c)| (t, r, c))
    }
}

/// Collects the placeholders and regions of one parsed part.
pub(crate) fn inspect_part(
    part: &str,
    xml: &str,
    parsed: &ParsedPart,
    info: &mut TemplateInfo,
) {
    let regions: Vec<_> = parsed
        .segments
        .iter()
        .filter_map(|s| match s {
            Segment::Rows(region) => Some(region),
            _ => None,
        })
        .collect();

    for region in &regions {
        info.regions.push(RegionInfo {
            list: region.list.clone(),
            var: region.var.clone(),
            part: part.to_string(),
            table: region.table,
            row: region.row,
            rows: region.rows,
            fields: region.fields(),
        });
    }

    let cells = CellMap::new(xml);
    for (index, paragraph) in find_elements(xml, "w:p").into_iter().enumerate() {
        let text = fragment_text(&xml[paragraph.clone()]);
        let location = match cells.locate(paragraph.start) {
            Some((table, row, cell)) => match regions
                .iter()
                .find(|r| r.table == table && (r.row..r.row + r.rows).contains(&row))
            {
                Some(region) => Location::LoopRow {
                    list: region.list.clone(),
                    table,
                    row,
                    cell,
                },
                None => Location::TableCell { table, row, cell },
            },
            None => Location::Paragraph { index },
        };
        for caps in VAR_TAG.captures_iter(&text) {
            info.placeholders.push(PlaceholderInfo {
                name: caps[1].trim().to_string(),
                part: part.to_string(),
                location: location.clone(),
            });
        }
    }
}
