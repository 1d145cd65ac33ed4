//! Markdown and HTML rendering of attribute runs
//!
//! Runs are laid out over the plaintext into lines first; both renderers
//! work from that line model.

use std::fmt::Write as _;

use crate::models::{AttributeRun, FontWeight, ParagraphStyle};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    text: String,
    weight: FontWeight,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Line {
    style: ParagraphStyle,
    spans: Vec<Span>,
    /// The line ended with a newline in the source text
    terminated: bool,
}

impl Line {
    fn push(&mut self, c: char, weight: FontWeight) {
        match self.spans.last_mut() {
            Some(span) if span.weight == weight => span.text.push(c),
            _ => self.spans.push(Span {
                text: c.to_string(),
                weight,
            }),
        }
    }

    fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text.is_empty())
    }
}

/// Apply runs left to right over `plaintext`
///
/// A run longer than the remaining text is clamped and ends the walk;
/// characters not covered by any run keep default formatting.
fn layout(plaintext: &str, runs: &[AttributeRun]) -> Vec<Line> {
    let mut chars = plaintext.chars().peekable();
    let mut lines = Vec::new();
    let mut line = Line::default();

    let mut emit = |c: char, weight: FontWeight, style: ParagraphStyle, line: &mut Line| {
        if line.style == ParagraphStyle::None {
            line.style = style;
        }
        if c == '\n' {
            line.terminated = true;
            lines.push(std::mem::take(line));
        } else {
            line.push(c, weight);
        }
    };

    for run in runs {
        if chars.peek().is_none() {
            break;
        }
        let mut taken = 0;
        while taken < run.length {
            let Some(c) = chars.next() else {
                break;
            };
            emit(c, run.font_weight, run.paragraph_style, &mut line);
            taken += 1;
        }
        if taken < run.length {
            break;
        }
    }

    for c in chars {
        emit(c, FontWeight::None, ParagraphStyle::None, &mut line);
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn markdown_prefix(style: ParagraphStyle) -> &'static str {
    match style {
        ParagraphStyle::Title => "# ",
        ParagraphStyle::Heading => "## ",
        ParagraphStyle::Subheading => "### ",
        ParagraphStyle::BulletDot | ParagraphStyle::BulletDash => "- ",
        ParagraphStyle::Numbered => "1. ",
        ParagraphStyle::Checkbox => "- [ ] ",
        ParagraphStyle::CheckedCheckbox => "- [x] ",
        ParagraphStyle::Monospace | ParagraphStyle::None => "",
    }
}

fn markdown_marker(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::None => "",
        FontWeight::Bold => "**",
        FontWeight::Italic => "*",
        FontWeight::BoldItalic => "***",
    }
}

/// Wrap the non-whitespace core of `text`, leaving surrounding spaces outside
fn wrap_trimmed(out: &mut String, text: &str, open: &str, close: &str) {
    let core = text.trim();
    if core.is_empty() || (open.is_empty() && close.is_empty()) {
        out.push_str(text);
        return;
    }
    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];
    out.push_str(leading);
    out.push_str(open);
    out.push_str(core);
    out.push_str(close);
    out.push_str(trailing);
}

/// Render plaintext and runs as Markdown
///
/// With no runs (or only default runs) the plaintext is returned unchanged.
pub fn render_markdown(plaintext: &str, runs: &[AttributeRun]) -> String {
    let mut out = String::with_capacity(plaintext.len() + 16);
    let mut in_code = false;

    for line in layout(plaintext, runs) {
        let monospace = line.style == ParagraphStyle::Monospace;
        if monospace && !in_code {
            out.push_str("```\n");
            in_code = true;
        } else if !monospace && in_code {
            close_fence(&mut out);
            in_code = false;
        }

        if monospace {
            out.push_str(&line.plain_text());
        } else {
            if !line.is_empty() {
                out.push_str(markdown_prefix(line.style));
            }
            for span in &line.spans {
                let marker = markdown_marker(span.weight);
                wrap_trimmed(&mut out, &span.text, marker, marker);
            }
        }

        if line.terminated {
            out.push('\n');
        }
    }

    if in_code {
        close_fence(&mut out);
    }
    out
}

fn close_fence(out: &mut String) {
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Paragraphs,
    Unordered,
    Ordered,
    Checklist,
    Code,
}

impl Block {
    const fn of(style: ParagraphStyle) -> Self {
        match style {
            ParagraphStyle::BulletDot | ParagraphStyle::BulletDash => Self::Unordered,
            ParagraphStyle::Numbered => Self::Ordered,
            ParagraphStyle::Checkbox | ParagraphStyle::CheckedCheckbox => Self::Checklist,
            ParagraphStyle::Monospace => Self::Code,
            _ => Self::Paragraphs,
        }
    }

    const fn open_tag(self) -> &'static str {
        match self {
            Self::Paragraphs => "",
            Self::Unordered => "<ul>",
            Self::Ordered => "<ol>",
            Self::Checklist => "<ul class=\"checklist\">",
            Self::Code => "<pre>",
        }
    }

    const fn close_tag(self) -> &'static str {
        match self {
            Self::Paragraphs => "",
            Self::Unordered | Self::Checklist => "</ul>",
            Self::Ordered => "</ol>",
            Self::Code => "</pre>",
        }
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn html_spans(line: &Line) -> String {
    let mut out = String::new();
    for span in &line.spans {
        let text = escape_html(&span.text);
        let (open, close) = match span.weight {
            FontWeight::None => ("", ""),
            FontWeight::Bold => ("<b>", "</b>"),
            FontWeight::Italic => ("<i>", "</i>"),
            FontWeight::BoldItalic => ("<b><i>", "</i></b>"),
        };
        wrap_trimmed(&mut out, &text, open, close);
    }
    out
}

/// Render plaintext and runs as an HTML fragment
pub fn render_html(plaintext: &str, runs: &[AttributeRun]) -> String {
    let mut out = String::new();
    let mut block = Block::Paragraphs;

    for line in layout(plaintext, runs) {
        let next = Block::of(line.style);
        if next != block {
            out.push_str(block.close_tag());
            out.push_str(next.open_tag());
            block = next;
        }

        let inner = html_spans(&line);
        match line.style {
            ParagraphStyle::Title => {
                let _ = write!(out, "<h1>{inner}</h1>");
            }
            ParagraphStyle::Heading => {
                let _ = write!(out, "<h2>{inner}</h2>");
            }
            ParagraphStyle::Subheading => {
                let _ = write!(out, "<h3>{inner}</h3>");
            }
            ParagraphStyle::BulletDot | ParagraphStyle::BulletDash | ParagraphStyle::Numbered => {
                let _ = write!(out, "<li>{inner}</li>");
            }
            ParagraphStyle::Checkbox => {
                let _ = write!(out, "<li><input type=\"checkbox\" disabled> {inner}</li>");
            }
            ParagraphStyle::CheckedCheckbox => {
                let _ = write!(
                    out,
                    "<li><input type=\"checkbox\" checked disabled> {inner}</li>"
                );
            }
            ParagraphStyle::Monospace => {
                out.push_str(&escape_html(&line.plain_text()));
                out.push('\n');
            }
            ParagraphStyle::None => {
                if line.is_empty() {
                    out.push_str("<div><br></div>");
                } else {
                    let _ = write!(out, "<div>{inner}</div>");
                }
            }
        }
    }

    out.push_str(block.close_tag());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_without_runs_is_plaintext() {
        let text = "first line\n\n*not emphasis*\nlast";
        assert_eq!(render_markdown(text, &[]), text);
        assert_eq!(render_markdown("ends with newline\n", &[]), "ends with newline\n");
        assert_eq!(render_markdown("", &[]), "");
    }

    #[test]
    fn test_default_runs_pass_through() {
        let runs = [AttributeRun::new(3), AttributeRun::new(10)];
        assert_eq!(render_markdown("abc\ndef", &runs), "abc\ndef");
    }

    #[test]
    fn test_markdown_headers_and_lists() {
        let text = "Title\nSection\nSub\none\ntwo\ndone\nbody";
        let runs = [
            AttributeRun::new(6).with_style(ParagraphStyle::Title),
            AttributeRun::new(8).with_style(ParagraphStyle::Heading),
            AttributeRun::new(4).with_style(ParagraphStyle::Subheading),
            AttributeRun::new(4).with_style(ParagraphStyle::BulletDot),
            AttributeRun::new(4).with_style(ParagraphStyle::Checkbox),
            AttributeRun::new(5).with_style(ParagraphStyle::CheckedCheckbox),
        ];
        assert_eq!(
            render_markdown(text, &runs),
            "# Title\n## Section\n### Sub\n- one\n- [ ] two\n- [x] done\nbody"
        );
    }

    #[test]
    fn test_markdown_weights_keep_spaces_outside_markers() {
        let runs = [
            AttributeRun::new(5).with_weight(FontWeight::Bold),
            AttributeRun::new(4).with_weight(FontWeight::Italic),
            AttributeRun::new(4).with_weight(FontWeight::BoldItalic),
        ];
        assert_eq!(render_markdown("bold ita both", &runs), "**bold** *ita* ***both***");
    }

    #[test]
    fn test_markdown_monospace_fences() {
        let runs = [
            AttributeRun::new(5),
            AttributeRun::new(10).with_style(ParagraphStyle::Monospace),
        ];
        assert_eq!(
            render_markdown("text\nlet x;\nx = 1", &runs),
            "text\n```\nlet x;\nx = 1\n```\n"
        );
    }

    #[test]
    fn test_run_past_end_is_clamped() {
        let runs = [
            AttributeRun::new(2).with_weight(FontWeight::Bold),
            AttributeRun::new(99).with_weight(FontWeight::Italic),
            AttributeRun::new(1).with_style(ParagraphStyle::Heading),
        ];
        assert_eq!(render_markdown("abcd", &runs), "**ab***cd*");
    }

    #[test]
    fn test_trailing_uncovered_text_is_verbatim() {
        let runs = [AttributeRun::new(3).with_weight(FontWeight::Bold)];
        assert_eq!(render_markdown("abc and more", &runs), "**abc** and more");
    }

    #[test]
    fn test_html_lists_are_grouped() {
        let text = "Todo\nmilk\neggs\nafter";
        let runs = [
            AttributeRun::new(5).with_style(ParagraphStyle::Heading),
            AttributeRun::new(5).with_style(ParagraphStyle::BulletDash),
            AttributeRun::new(5).with_style(ParagraphStyle::BulletDash),
        ];
        assert_eq!(
            render_html(text, &runs),
            "<h2>Todo</h2><ul><li>milk</li><li>eggs</li></ul><div>after</div>"
        );
    }

    #[test]
    fn test_html_escapes_and_weights() {
        let runs = [AttributeRun::new(5).with_weight(FontWeight::Bold)];
        assert_eq!(
            render_html("a < b\n\nc & d", &runs),
            "<div><b>a &lt; b</b></div><div><br></div><div>c &amp; d</div>"
        );
    }

    #[test]
    fn test_html_checklist() {
        let runs = [
            AttributeRun::new(4).with_style(ParagraphStyle::Checkbox),
            AttributeRun::new(4).with_style(ParagraphStyle::CheckedCheckbox),
        ];
        assert_eq!(
            render_html("one\ntwo\n", &runs),
            "<ul class=\"checklist\"><li><input type=\"checkbox\" disabled> one</li>\
             <li><input type=\"checkbox\" checked disabled> two</li></ul>"
        );
    }
}
