//! Markdown-like rendering of streamed study content.
//!
//! The renderer is re-run on the whole accumulated text after every delta,
//! so it is a single forward pass over the lines. Every call is independent
//! and always returns balanced HTML, even for a prefix that stops in the
//! middle of a table, list or code fence.
//!
//! Supported blocks, in precedence order: fenced code, pipe tables, headings
//! (`#` to `####`), horizontal rules (`---`), unordered (`* `, `- `) and
//! ordered (`1. `) list items, and paragraphs. Inline rules run bold, then
//! italic, then inline code.
//!
//! A code fence with no closing fence runs to the end of the input and is
//! closed in the output.

use std::sync::OnceLock;

use itertools::Itertools;
use nonempty::NonEmpty;
use regex::Regex;

/// Compiled inline patterns: bold, italic, inline code.
static INLINE_RULES: OnceLock<[Regex; 3]> = OnceLock::new();

fn inline_rules() -> &'static [Regex; 3] {
    INLINE_RULES.get_or_init(|| {
        [r"\*\*(.+?)\*\*", r"\*([^*]+)\*", r"`([^`]+)`"]
            .map(|pattern| Regex::new(pattern).expect("inline pattern is valid"))
    })
}

/// Render markdown-like text to HTML.
///
/// # Example
/// ```
/// use studykit::markdown::render_markdown;
///
/// assert_eq!(render_markdown("## Heap\n"), "<h2>Heap</h2>");
/// assert_eq!(
///     render_markdown("**O(log n)** insert"),
///     "<p><strong>O(log n)</strong> insert</p>"
/// );
/// ```
pub fn render_markdown(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Output::with_capacity(text.len() * 2);

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        if let Some(info) = line.strip_prefix("```") {
            out.close_blocks();
            let close = lines[i + 1..]
                .iter()
                .position(|l| l.trim() == "```")
                .map(|offset| i + 1 + offset);
            let body_end = close.unwrap_or(lines.len());
            out.code_block(info.trim(), &lines[i + 1..body_end]);
            i = close.map_or(lines.len(), |c| c + 1);
            continue;
        }

        if let Some((table, consumed)) = Table::parse(&lines[i..]) {
            out.close_blocks();
            out.table(&table);
            i += consumed;
            continue;
        }

        if line.is_empty() {
            out.close_blocks();
        } else if let Some((level, content)) = heading(line) {
            out.close_blocks();
            out.html.push_str(&format!("<h{level}>{}</h{level}>", inline(content)));
        } else if line == "---" {
            out.close_blocks();
            out.html.push_str("<hr>");
        } else if let Some((kind, item)) = list_item(line) {
            out.list_item(kind, item);
        } else {
            out.paragraph_line(line);
        }
        i += 1;
    }

    out.close_blocks();
    out.html
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// HTML being built plus the paragraph or list still open.
struct Output {
    html: String,
    paragraph: Vec<String>,
    list: Option<(ListKind, Vec<String>)>,
}

impl Output {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            html: String::with_capacity(capacity),
            paragraph: Vec::new(),
            list: None,
        }
    }

    fn paragraph_line(&mut self, line: &str) {
        self.close_list();
        self.paragraph.push(inline(line));
    }

    fn list_item(&mut self, kind: ListKind, item: &str) {
        self.close_paragraph();
        if self.list.as_ref().is_some_and(|(open, _)| *open != kind) {
            self.close_list();
        }
        self.list
            .get_or_insert_with(|| (kind, Vec::new()))
            .1
            .push(inline(item));
    }

    fn code_block(&mut self, language: &str, body: &[&str]) {
        let code = escape_html(&body.join("\n"));
        if language.is_empty() {
            self.html.push_str(&format!("<pre><code>{code}</code></pre>"));
        } else {
            self.html.push_str(&format!(
                "<pre><code class=\"language-{}\">{code}</code></pre>",
                escape_html(language)
            ));
        }
    }

    fn table(&mut self, table: &Table) {
        let header = table
            .header
            .iter()
            .map(|cell| format!("<th>{}</th>", inline(cell)))
            .join("");
        let rows = table
            .rows
            .iter()
            .map(|row| {
                let cells = row.iter().map(|cell| format!("<td>{}</td>", inline(cell))).join("");
                format!("<tr>{cells}</tr>")
            })
            .join("");
        self.html.push_str(&format!(
            "<table><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>"
        ));
    }

    fn close_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            self.html.push_str(&format!("<p>{}</p>", self.paragraph.join("<br>")));
            self.paragraph.clear();
        }
    }

    fn close_list(&mut self) {
        if let Some((kind, items)) = self.list.take() {
            let tag = kind.tag();
            let items = items.iter().map(|item| format!("<li>{item}</li>")).join("");
            self.html.push_str(&format!("<{tag}>{items}</{tag}>"));
        }
    }

    fn close_blocks(&mut self) {
        self.close_paragraph();
        self.close_list();
    }
}

/// A pipe table: header, separator, and at least one data row.
#[derive(Debug, PartialEq)]
struct Table {
    header: Vec<String>,
    rows: NonEmpty<Vec<String>>,
}

impl Table {
    /// Parse a table starting at `lines[0]`, returning it with the number of lines used.
    fn parse(lines: &[&str]) -> Option<(Table, usize)> {
        let (header, separator) = match lines {
            [header, separator, ..] => (header.trim(), separator.trim()),
            _ => return None,
        };
        if !header.contains('|') || is_separator(header) || !is_separator(separator) {
            return None;
        }

        let rows: Vec<Vec<String>> = lines[2..]
            .iter()
            .map(|l| l.trim())
            .take_while(|l| l.contains('|') && !is_separator(l))
            .map(split_cells)
            .collect();
        let consumed = 2 + rows.len();

        Some((
            Table {
                header: split_cells(header),
                rows: NonEmpty::from_vec(rows)?,
            },
            consumed,
        ))
    }
}

fn is_separator(line: &str) -> bool {
    line.contains('|')
        && line.contains('-')
        && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn split_cells(line: &str) -> Vec<String> {
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if !(1..=4).contains(&level) {
        return None;
    }
    line[level..].strip_prefix(' ').map(|content| (level, content.trim()))
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(item) = line.strip_prefix("* ").or_else(|| line.strip_prefix("- ")) {
        return Some((ListKind::Unordered, item));
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..]
        .strip_prefix(". ")
        .map(|item| (ListKind::Ordered, item))
}

fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let [bold, italic, code] = inline_rules();
    let html = bold.replace_all(&escaped, "<strong>$1</strong>");
    let html = italic.replace_all(&html, "<em>$1</em>");
    code.replace_all(&html, "<code>$1</code>").into_owned()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
