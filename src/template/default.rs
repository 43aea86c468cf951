//! The standard teaching-design template, generated from the field catalogue.

use crate::docx::Package;
use crate::docx::xml::escape_text;
use crate::error::TemplateError;
use crate::schema::{ACTIVITIES_KEY, FieldSlot, SCALAR_FIELDS, document_order};
use itertools::Itertools;

pub const DEFAULT_TITLE: &str = "思维发展型课堂教学设计";

/// Scalars shown in the header table rather than as numbered sections.
const INFO_FIELD_COUNT: usize = 7;

const SECTION_NUMERALS: &[&str] = &["一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "十一", "十二"];

fn paragraph(text: &str, style: Option<&str>, centered: bool, bold: bool) -> String {
    let mut properties = String::new();
    if let Some(style) = style {
        properties.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, style));
    }
    if centered {
        properties.push_str(r#"<w:jc w:val="center"/>"#);
    }
    let properties = if properties.is_empty() {
        String::new()
    } else {
        format!("<w:pPr>{}</w:pPr>", properties)
    };
    let run_properties = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    if text.is_empty() {
        return format!("<w:p>{}</w:p>", properties);
    }
    format!(
        r#"<w:p>{}<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        properties,
        run_properties,
        escape_text(text)
    )
}

fn cell(text: &str, width: u32, bold: bool) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>{}</w:tc>"#,
        width,
        paragraph(text, None, true, bold)
    )
}

fn table(widths: &[u32], rows: &[(Vec<String>, bool)]) -> String {
    let grid: String = widths
        .iter()
        .map(|w| format!(r#"<w:gridCol w:w="{}"/>"#, w))
        .collect();
    let body: String = rows
        .iter()
        .map(|(cells, bold)| {
            let cells: String = cells
                .iter()
                .zip(widths)
                .map(|(text, width)| cell(text, *width, *bold))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!(
        concat!(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:jc w:val="center"/>"#,
            r#"<w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>{}</w:tblGrid>{}</w:tbl>"#
        ),
        grid, body
    )
}

fn placeholder(name: &str) -> String {
    format!("{{{{ {} }}}}", name)
}

fn loop_cell(var: &str, list: &str, field: &str) -> String {
    format!(
        "{{% for {var} in {list} %}}{{{{ {var}.{field} }}}}{{% endfor %}}",
        var = var,
        list = list,
        field = field
    )
}

/// The loop variable name used for a list in the default template.
fn loop_var(list: &str) -> &'static str {
    if list == ACTIVITIES_KEY { "activity" } else { "point" }
}

/// Body XML of the default template.
pub fn default_template_body() -> String {
    let mut body = paragraph(DEFAULT_TITLE, Some("Title"), true, true);

    let info_rows: Vec<(Vec<String>, bool)> = SCALAR_FIELDS[..INFO_FIELD_COUNT]
        .chunks(2)
        .map(|pair| {
            let mut cells: Vec<String> = pair
                .iter()
                .flat_map(|f| [f.label.to_string(), placeholder(f.key)])
                .collect();
            cells.resize(4, String::new());
            (cells, false)
        })
        .collect();
    body.push_str(&table(&[1728, 2592, 1728, 2592], &info_rows));
    body.push_str(&paragraph("", None, false, false));

    let info_keys: Vec<&str> = SCALAR_FIELDS[..INFO_FIELD_COUNT].iter().map(|f| f.key).collect();
    let sections = document_order()
        .into_iter()
        .filter(|slot| !info_keys.contains(&slot.key()));

    for (number, slot) in SECTION_NUMERALS.iter().zip(sections) {
        body.push_str(&paragraph(
            &format!("{}、{}", number, slot.label()),
            Some("Heading1"),
            false,
            false,
        ));
        match slot {
            FieldSlot::Scalar(spec) => {
                body.push_str(&paragraph(&placeholder(spec.key), None, false, false));
            }
            FieldSlot::List(spec) => {
                let widths: &[u32] = if spec.item_fields.len() == 4 {
                    &[2160, 3600, 3600, 2160]
                } else {
                    &[2880, 5760]
                };
                let header = spec.item_fields.iter().map(|f| f.label.to_string()).collect_vec();
                let var = loop_var(spec.key);
                let row = spec
                    .item_fields
                    .iter()
                    .map(|f| loop_cell(var, spec.key, f.key))
                    .collect_vec();
                body.push_str(&table(widths, &[(header, true), (row, false)]));
            }
        }
    }
    body
}

/// The default template as a `.docx` package.
pub fn default_package() -> Package {
    Package::from_document_body(&default_template_body())
}

/// The default template as `.docx` bytes.
pub fn default_template() -> Result<Vec<u8>, TemplateError> {
    default_package().to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse::{Segment, parse_part};

    #[test]
    fn default_body_has_two_loop_regions_and_no_global_intent() {
        let body = default_template_body();
        assert!(!body.contains("{{ activity_intent }}"));
        assert!(body.contains("{{ activity.activity_intent }}"));

        let (_, parsed) = parse_part("word/document.xml", &body).unwrap();
        let lists: Vec<&str> = parsed
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Rows(r) => Some(r.list.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lists, vec!["learning_activities", "reflection_thinking_points"]);
    }

    #[test]
    fn sections_are_numbered_one_to_ten() {
        let body = default_template_body();
        assert!(body.contains("一、课例概述"));
        assert!(body.contains("六、学习活动设计"));
        assert!(body.contains("十、思维训练点设计"));
        assert!(!body.contains("十一、"));
    }
}
