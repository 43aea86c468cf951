//! Template markup: a docxtpl-compatible subset of Jinja.
//!
//! * `{{ key }}` and `{{ item.field }}` print a value;
//! * `{% for item in list %}` / `{% endfor %}` inside a table row repeat that row;
//! * `{%tr for item in list %}` / `{%tr endfor %}` on their own rows repeat the
//!   rows between them.

use crate::docx::xml::{find_elements, preserve_space, text_elements, text_spans};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) static VAR_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("valid regex"));

pub(crate) static BLOCK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{%-?\s*(.*?)\s*-?%\}").expect("valid regex"));

static FOR_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(tr\s+)?for\s+([A-Za-z_][A-Za-z0-9_]*)\s+in\s+([A-Za-z_][A-Za-z0-9_]*)$")
        .expect("valid regex")
});

static ENDFOR_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(tr\s+)?endfor$").expect("valid regex"));

/// A reference printed by `{{ … }}`: either `root` or `root.field`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub root: String,
    pub field: Option<String>,
}

impl VarRef {
    pub fn parse(expr: &str) -> Self {
        match expr.split_once('.') {
            Some((root, field)) => VarRef {
                root: root.trim().to_string(),
                field: Some(field.trim().to_string()),
            },
            None => VarRef {
                root: expr.trim().to_string(),
                field: None,
            },
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.root, field),
            None => write!(f, "{}", self.root),
        }
    }
}

/// A `{% … %}` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    For {
        var: String,
        list: String,
        row_marker: bool,
    },
    EndFor {
        row_marker: bool,
    },
    Unsupported(String),
}

impl Statement {
    pub fn parse(body: &str) -> Self {
        let body = body.trim();
        if let Some(caps) = FOR_STATEMENT.captures(body) {
            return Statement::For {
                var: caps[2].to_string(),
                list: caps[3].to_string(),
                row_marker: caps.get(1).is_some(),
            };
        }
        if let Some(caps) = ENDFOR_STATEMENT.captures(body) {
            return Statement::EndFor {
                row_marker: caps.get(1).is_some(),
            };
        }
        Statement::Unsupported(body.to_string())
    }
}

/// All statements found in a piece of text, in order.
pub fn statements(text: &str) -> Vec<Statement> {
    BLOCK_TAG
        .captures_iter(text)
        .map(|caps| Statement::parse(&caps[1]))
        .collect()
}

/// Rewrites paragraphs so that each tag sits inside a single `<w:t>` element.
///
/// Word often splits typed text into many runs (spell-check marks, revision
/// ids). The text of a split tag is moved into the run where the tag opens;
/// the runs it came from keep their properties and any other content. Every
/// text element holding a tag is marked `xml:space="preserve"` so substituted
/// values keep their edge whitespace.
pub fn normalize_runs(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut last = 0;
    for range in find_elements(xml, "w:p") {
        let paragraph = &xml[range.clone()];
        if has_tags(paragraph) {
            out.push_str(&xml[last..range.start]);
            out.push_str(&regroup_paragraph(paragraph));
            last = range.end;
        }
    }
    out.push_str(&xml[last..]);
    out
}

fn has_tags(paragraph: &str) -> bool {
    let joined: String = text_elements(paragraph).concat();
    joined.contains("{{") || joined.contains("{%")
}

fn regroup_paragraph(paragraph: &str) -> String {
    let spans = text_spans(paragraph);
    let pieces: Vec<&str> = spans.iter().map(|span| &paragraph[span.content.clone()]).collect();
    let regrouped = regroup_tags(&pieces);

    let mut out = String::with_capacity(paragraph.len());
    let mut last = 0;
    for ((span, piece), text) in spans.iter().zip(&pieces).zip(&regrouped) {
        if text.as_str() == *piece && !text.contains("{{") {
            continue;
        }
        out.push_str(&paragraph[last..span.element.start]);
        out.push_str(&preserve_space(span.open_tag(paragraph)));
        out.push_str(text);
        out.push_str("</w:t>");
        last = span.element.end;
    }
    out.push_str(&paragraph[last..]);
    out
}

/// Moves every tag that spans several text pieces into the piece it opens in.
///
/// Pieces are raw element content; braces never occur inside an entity, so
/// cutting at tag boundaries keeps entities whole. A tag that is never closed
/// swallows the rest of the paragraph and is reported later by the parser.
fn regroup_tags(pieces: &[&str]) -> Vec<String> {
    let chars: Vec<(usize, char)> = pieces
        .iter()
        .enumerate()
        .flat_map(|(i, piece)| piece.chars().map(move |c| (i, c)))
        .collect();
    let mut out = vec![String::new(); pieces.len()];
    // Piece the open tag belongs to and the character preceding its final `}`.
    let mut open: Option<(usize, char)> = None;

    let mut k = 0;
    while k < chars.len() {
        let (piece, c) = chars[k];
        let next = chars.get(k + 1).map(|&(_, n)| n);
        match open {
            None => {
                out[piece].push(c);
                if c == '{'
                    && let Some(n @ ('{' | '%')) = next
                {
                    out[piece].push(n);
                    open = Some((piece, if n == '{' { '}' } else { '%' }));
                    k += 1;
                }
            }
            Some((owner, closer)) => {
                out[owner].push(c);
                if c == closer && next == Some('}') {
                    out[owner].push('}');
                    open = None;
                    k += 1;
                }
            }
        }
        k += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_for_statements() {
        assert_eq!(
            Statement::parse("for activity in learning_activities"),
            Statement::For {
                var: "activity".to_string(),
                list: "learning_activities".to_string(),
                row_marker: false,
            }
        );
        assert_eq!(
            Statement::parse("tr endfor"),
            Statement::EndFor { row_marker: true }
        );
        assert!(matches!(
            Statement::parse("if summary"),
            Statement::Unsupported(_)
        ));
    }

    #[test]
    fn var_ref_splits_on_dot() {
        let var = VarRef::parse(" activity.name ");
        assert_eq!(var.root, "activity");
        assert_eq!(var.field.as_deref(), Some("name"));
        assert_eq!(var.to_string(), "activity.name");
    }

    #[test]
    fn split_placeholder_moves_into_its_opening_run() {
        let xml = concat!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>{{ lesson</w:t></w:r>"#,
            r#"<w:r><w:rPr><w:i/></w:rPr><w:t>_name }} 课</w:t></w:r></w:p>"#
        );
        assert_eq!(
            normalize_runs(xml),
            concat!(
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
                r#"<w:r><w:rPr><w:b/></w:rPr>"#,
                r#"<w:t xml:space="preserve">{{ lesson_name }}</w:t></w:r>"#,
                r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve"> 课</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn split_tag_leaves_other_runs_alone() {
        let drawing =
            r#"<w:r><w:drawing><wp:inline><a:blip r:embed="rId5"/></wp:inline></w:drawing></w:r>"#;
        let xml = format!(
            "<w:p><w:r><w:t>Title: {{{{ lesson_</w:t></w:r><w:r><w:t>name }}}}</w:t></w:r>{}{}</w:p>",
            drawing, "<w:r><w:tab/></w:r>"
        );
        let normalized = normalize_runs(&xml);
        assert!(normalized.contains(drawing));
        assert!(normalized.contains("<w:r><w:tab/></w:r>"));
        assert!(normalized.contains(r#"<w:t xml:space="preserve">Title: {{ lesson_name }}</w:t>"#));
    }

    #[test]
    fn split_block_tag_is_regrouped() {
        let pieces = ["{", "% for a in b %", "}{{ a.x }", "}"];
        assert_eq!(
            regroup_tags(&pieces),
            vec!["{% for a in b %}", "", "{{ a.x }}", ""]
        );
    }

    #[test]
    fn paragraphs_without_tags_are_untouched() {
        let xml = r#"<w:p><w:r><w:t>plain</w:t></w:r></w:p>"#;
        assert_eq!(normalize_runs(xml), xml);
    }

    #[test]
    fn placeholder_text_is_marked_preserve() {
        let xml = r#"<w:p><w:r><w:t>{{ a }}</w:t></w:r><w:r><w:t>plain</w:t></w:r></w:p>"#;
        assert_eq!(
            normalize_runs(xml),
            concat!(
                r#"<w:p><w:r><w:t xml:space="preserve">{{ a }}</w:t></w:r>"#,
                r#"<w:r><w:t>plain</w:t></w:r></w:p>"#
            )
        );
    }
}
