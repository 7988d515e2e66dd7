/*!
 * Lightweight markup rendering for Telegram HTML.
 *
 * Only three constructs are recognized inside plain text:
 * - `[label](https://url)` becomes `<a href="url">label</a>`
 * - `**bold**` / `__bold__` becomes `<b>bold</b>`
 * - `*italic*` / `_italic_` becomes `<i>italic</i>`
 *
 * Everything else, including malformed or unmatched delimiters, is emitted
 * as escaped literal text.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Link token anchored at the scan position
static LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap()
});

/// Bold token anchored at the scan position (shortest inner match, may span lines)
static BOLD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?s)(?:\*\*(.+?)\*\*|__(.+?)__)").unwrap()
});

/// A recognized formatting construct borrowed from the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormattingToken<'a> {
    /// `[label](href)`
    Link { label: &'a str, href: &'a str },
    /// `**inner**` or `__inner__`
    Bold(&'a str),
    /// `*inner*` or `_inner_`
    Italic(&'a str),
}

impl FormattingToken<'_> {
    /// Append the escaped HTML form of this token
    fn write_html(&self, out: &mut String) {
        match self {
            Self::Link { label, href } => {
                out.push_str("<a href=\"");
                escape_into(out, href);
                out.push_str("\">");
                escape_into(out, label);
                out.push_str("</a>");
            }
            Self::Bold(inner) => {
                out.push_str("<b>");
                escape_into(out, inner);
                out.push_str("</b>");
            }
            Self::Italic(inner) => {
                out.push_str("<i>");
                escape_into(out, inner);
                out.push_str("</i>");
            }
        }
    }
}

/// Renderer for the supported markup subset
pub struct MarkupRenderer;

impl MarkupRenderer {
    /// Convert text to safe HTML, recognizing links, bold and italics
    pub fn render(text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(text.len() + text.len() / 8);
        let mut literal_start = 0;
        let mut pos = 0;

        while pos < text.len() {
            if let Some((token, end)) = Self::token_at(text, pos) {
                escape_into(&mut out, &text[literal_start..pos]);
                token.write_html(&mut out);
                pos = end;
                literal_start = end;
                continue;
            }
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
        }

        escape_into(&mut out, &text[literal_start..]);
        out
    }

    /// Escape every markup-significant character
    pub fn escape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        escape_into(&mut out, text);
        out
    }

    /// Bold, bracketed label placed on its own paragraph
    pub fn category_tag(label: &str) -> String {
        format!("[<b>{}</b>]\n\n", Self::escape(label))
    }

    /// Try to match a token starting exactly at byte offset `pos`.
    ///
    /// Returns the token and the byte offset just past it.
    pub fn token_at(text: &str, pos: usize) -> Option<(FormattingToken<'_>, usize)> {
        let rest = &text[pos..];
        match rest.as_bytes().first()? {
            b'[' => {
                let caps = LINK_REGEX.captures(rest)?;
                let whole = caps.get(0)?;
                let label = caps.get(1)?.as_str();
                let href = caps.get(2)?.as_str();
                Some((FormattingToken::Link { label, href }, pos + whole.end()))
            }
            b'*' | b'_' => Self::bold_at(text, pos).or_else(|| Self::italic_at(text, pos)),
            _ => None,
        }
    }

    fn bold_at(text: &str, pos: usize) -> Option<(FormattingToken<'_>, usize)> {
        let caps = BOLD_REGEX.captures(&text[pos..])?;
        let whole = caps.get(0)?;
        let inner = caps.get(1).or_else(|| caps.get(2))?;
        Some((FormattingToken::Bold(inner.as_str()), pos + whole.end()))
    }

    /// Single-delimiter italics: neither delimiter may touch another copy of itself
    fn italic_at(text: &str, pos: usize) -> Option<(FormattingToken<'_>, usize)> {
        let delim = text[pos..].chars().next()?;
        if text[..pos].ends_with(delim) {
            return None;
        }

        let inner_start = pos + delim.len_utf8();
        let mut inner = text[inner_start..].char_indices();
        let (_, first) = inner.next()?;
        if first == delim {
            return None;
        }

        for (offset, c) in inner {
            if c != delim {
                continue;
            }
            let close = inner_start + offset;
            let after = close + delim.len_utf8();
            if text[..close].ends_with(delim) || text[after..].starts_with(delim) {
                continue;
            }
            return Some((FormattingToken::Italic(&text[inner_start..close]), after));
        }

        None
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}
