//! HTML to plain-text conversion for index records.

use scraper::{ElementRef, Html};

/// Converts rich HTML into the plain text stored in the index.
pub trait TextExtractor: Send + Sync {
    /// Render `html` as plain text. Never fails; malformed markup degrades gracefully.
    fn to_plain_text(&self, html: &str) -> String;
}

/// [`TextExtractor`] backed by the `scraper` HTML parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

const SKIPPED: &[&str] = &["script", "style", "template", "noscript", "head"];

const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tr", "ul",
];

impl TextExtractor for HtmlTextExtractor {
    fn to_plain_text(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }
        let document = Html::parse_fragment(html);
        let mut buffer = LineBuffer::default();
        walk(document.root_element(), &mut buffer);
        buffer.finish()
    }
}

fn walk(element: ElementRef<'_>, buffer: &mut LineBuffer) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            buffer.push(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if SKIPPED.contains(&name) {
            continue;
        }
        match name {
            "br" => buffer.break_line(),
            "td" | "th" => {
                buffer.push(" ");
                walk(child, buffer);
                buffer.push(" ");
            }
            block if BLOCKS.contains(&block) => {
                buffer.break_line();
                walk(child, buffer);
                buffer.break_line();
            }
            _ => walk(child, buffer),
        }
    }
}

/// Accumulates text, collapsing whitespace per line and dropping blank lines.
#[derive(Default)]
struct LineBuffer {
    lines: Vec<String>,
    current: String,
}

impl LineBuffer {
    fn push(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn break_line(&mut self) {
        let line = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}
