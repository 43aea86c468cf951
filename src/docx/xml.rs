//! Minimal WordprocessingML helpers.
//!
//! Documents are handled as text: elements are located by scanning for their
//! start and end tags with depth counting, which is enough for the `w:` body
//! vocabulary a template uses.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static TEXT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:br\s*/>|<w:cr\s*/>|<w:tab\s*/>")
        .expect("valid regex")
});

static TEXT_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("valid regex"));

/// Escapes text for use inside an XML element.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_text`] plus numeric character references.
pub fn unescape_text(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Converts a value into run content for insertion inside an open `<w:t>`.
///
/// Newlines become `<w:br/>` and tabs `<w:tab/>`, closing and reopening the
/// text element around them.
pub fn run_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => out.push_str(r#"</w:t><w:br/><w:t xml:space="preserve">"#),
            '\t' => out.push_str(r#"</w:t><w:tab/><w:t xml:space="preserve">"#),
            '\r' => {}
            _ => out.push_str(&escape_text(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}

/// Visible text of a paragraph or any fragment: `<w:t>` contents, with breaks
/// as `\n` and tabs as `\t`.
pub fn fragment_text(xml: &str) -> String {
    let mut out = String::new();
    for caps in TEXT_TOKEN.captures_iter(xml) {
        match caps.get(1) {
            Some(text) => out.push_str(&unescape_text(text.as_str())),
            None if caps[0].starts_with("<w:tab") => out.push('\t'),
            None => out.push('\n'),
        }
    }
    out
}

/// Contents of every `<w:t>` element in a fragment, unescaped.
pub fn text_elements(xml: &str) -> Vec<String> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .map(|caps| unescape_text(&caps[1]))
        .collect()
}

/// A `<w:t>` element and its raw (still escaped) content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub element: Range<usize>,
    pub content: Range<usize>,
}

impl TextSpan {
    /// The opening `<w:t …>` tag.
    pub fn open_tag<'a>(&self, xml: &'a str) -> &'a str {
        &xml[self.element.start..self.content.start]
    }
}

/// Every `<w:t>…</w:t>` element of a fragment, in document order.
pub fn text_spans(xml: &str) -> Vec<TextSpan> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|caps| {
            Some(TextSpan {
                element: caps.get(0)?.range(),
                content: caps.get(1)?.range(),
            })
        })
        .collect()
}

/// `open` with `xml:space="preserve"` added, so Word keeps edge whitespace.
pub fn preserve_space(open: &str) -> String {
    if open.contains("xml:space=") {
        return open.to_string();
    }
    format!(r#"{} xml:space="preserve">"#, open.trim_end_matches('>'))
}

/// Byte ranges of the outermost `<tag>` elements in `xml`, in document order.
///
/// Self-closing elements are included. Unbalanced end tags are skipped.
pub fn find_elements(xml: &str, tag: &str) -> Vec<Range<usize>> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut pos = 0usize;

    while pos < xml.len() {
        let next_open = find_start_tag(xml, pos, &open);
        let next_close = xml[pos..].find(&close).map(|i| i + pos);

        match (next_open, next_close) {
            (Some(tag_at), close_at) if close_at.is_none_or(|c| tag_at.start < c) => {
                if tag_at.self_closing {
                    if depth == 0 {
                        found.push(tag_at.start..tag_at.end);
                    }
                } else {
                    if depth == 0 {
                        start = tag_at.start;
                    }
                    depth += 1;
                }
                pos = tag_at.end;
            }
            (_, Some(close_at)) => {
                let end = close_at + close.len();
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        found.push(start..end);
                    }
                }
                pos = end;
            }
            _ => break,
        }
    }
    found
}

/// Shifts ranges found inside `xml[base..]` back to absolute offsets.
pub fn find_elements_in(xml: &str, within: Range<usize>, tag: &str) -> Vec<Range<usize>> {
    let base = within.start;
    find_elements(&xml[within], tag)
        .into_iter()
        .map(|r| r.start + base..r.end + base)
        .collect()
}

struct StartTag {
    start: usize,
    end: usize,
    self_closing: bool,
}

fn find_start_tag(xml: &str, from: usize, open: &str) -> Option<StartTag> {
    let mut search = from;
    loop {
        let at = xml[search..].find(open)? + search;
        let after = at + open.len();
        match xml[after..].chars().next() {
            Some('>') | Some('/') | Some(' ') | Some('\t') | Some('\n') | Some('\r') => {
                let gt = xml[after..].find('>')? + after;
                return Some(StartTag {
                    start: at,
                    end: gt + 1,
                    self_closing: xml[..gt].ends_with('/'),
                });
            }
            _ => search = after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_round_trips_markup_characters() {
        let raw = r#"a < b & "c" > 'd'"#;
        assert_eq!(unescape_text(&escape_text(raw)), raw);
        assert_eq!(unescape_text("&#x4E2D;&#25991;"), "中文");
        assert_eq!(unescape_text("AT&T"), "AT&T");
    }

    #[test]
    fn text_spans_locate_content_and_preserve_is_added_once() {
        let xml = r#"<w:r><w:t>a</w:t><w:tab/><w:t xml:space="preserve"> b</w:t></w:r>"#;
        let spans = text_spans(xml);
        assert_eq!(spans.len(), 2);
        assert_eq!(&xml[spans[1].content.clone()], " b");
        assert_eq!(preserve_space(spans[0].open_tag(xml)), r#"<w:t xml:space="preserve">"#);
        assert_eq!(preserve_space(spans[1].open_tag(xml)), r#"<w:t xml:space="preserve">"#);
    }

    #[test]
    fn find_elements_skips_prefix_collisions_and_nesting() {
        let xml = "<w:p><w:pPr/><w:r><w:t>a</w:t></w:r></w:p><w:p/><w:tbl><w:tr><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        let paragraphs = find_elements(xml, "w:p");
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(&xml[paragraphs[1].clone()], "<w:p/>");
        let tables = find_elements(xml, "w:tbl");
        assert_eq!(tables.len(), 1);
        let rows = find_elements_in(xml, tables[0].clone(), "w:tr");
        assert!(xml[rows[0].clone()].starts_with("<w:tr>"));
    }

    #[test]
    fn fragment_text_keeps_breaks_and_tabs() {
        let xml = r#"<w:r><w:t>a</w:t><w:br/><w:t xml:space="preserve"> b</w:t><w:tab/><w:t>&amp;</w:t></w:r>"#;
        assert_eq!(fragment_text(xml), "a\n b\t&");
    }

    #[test]
    fn run_text_breaks_lines() {
        assert_eq!(
            run_text("x\ny<"),
            r#"x</w:t><w:br/><w:t xml:space="preserve">y&lt;"#
        );
    }
}
