//! Terminal colorization used by the renderer.
//!
//! The renderer never checks whether color is wanted; it is handed a
//! [`Highlighter`] once and calls it unconditionally. [`PlainHighlighter`]
//! is the no-op choice.

use regex::{Captures, Regex};

use crate::PprofResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Profiled program source.
    Source,
    /// Structured dumps.
    Json,
}

/// Applies terminal color to `text`. Implementations must keep the number
/// of lines unchanged.
pub trait Highlighter {
    fn highlight(&self, text: &str, language: Language) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, text: &str, _language: Language) -> String {
        text.to_string()
    }
}

const SOURCE_TOKENS: &str = r#"(?P<comment>#.*$)|(?P<string>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')|(?P<keyword>\b(?:and|as|assert|break|class|continue|def|del|elif|else|except|finally|for|from|global|if|import|in|is|lambda|not|or|pass|raise|return|try|while|with|yield|None|True|False)\b)|(?P<number>\b\d+(?:\.\d+)?\b)"#;

const JSON_TOKENS: &str = r#"(?P<key>"(?:[^"\\]|\\.)*"\s*:)|(?P<string>"(?:[^"\\]|\\.)*")|(?P<literal>\b(?:true|false|null)\b)|(?P<number>-?\b\d+(?:\.\d+)?(?:[eE][-+]?\d+)?\b)"#;

/// Token-level ANSI coloring, one line at a time.
#[derive(Debug, Clone)]
pub struct AnsiHighlighter {
    source: Regex,
    json: Regex,
}

impl AnsiHighlighter {
    pub fn new() -> PprofResult<Self> {
        Ok(Self {
            source: Regex::new(SOURCE_TOKENS)?,
            json: Regex::new(JSON_TOKENS)?,
        })
    }

    fn color_source(caps: &Captures<'_>) -> String {
        let (text, ansi) = if let Some(m) = caps.name("comment") {
            (m.as_str(), "90")
        } else if let Some(m) = caps.name("string") {
            (m.as_str(), "32")
        } else if let Some(m) = caps.name("keyword") {
            (m.as_str(), "35;1")
        } else if let Some(m) = caps.name("number") {
            (m.as_str(), "33")
        } else {
            return caps[0].to_string();
        };
        style(text, ansi)
    }

    fn color_json(caps: &Captures<'_>) -> String {
        let (text, ansi) = if let Some(m) = caps.name("key") {
            (m.as_str(), "36")
        } else if let Some(m) = caps.name("string") {
            (m.as_str(), "32")
        } else if let Some(m) = caps.name("literal") {
            (m.as_str(), "35")
        } else if let Some(m) = caps.name("number") {
            (m.as_str(), "33")
        } else {
            return caps[0].to_string();
        };
        style(text, ansi)
    }
}

impl Highlighter for AnsiHighlighter {
    fn highlight(&self, text: &str, language: Language) -> String {
        text.split('\n')
            .map(|line| match language {
                Language::Source => self
                    .source
                    .replace_all(line, |caps: &Captures<'_>| Self::color_source(caps))
                    .into_owned(),
                Language::Json => self
                    .json
                    .replace_all(line, |caps: &Captures<'_>| Self::color_json(caps))
                    .into_owned(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn style(text: &str, ansi: &str) -> String {
    format!("\x1b[{ansi}m{text}\x1b[0m")
}

/// Highlights the given source lines as one text and splits the result back
/// into exactly `lines.len()` rows.
pub fn colorize_lines(highlighter: &dyn Highlighter, lines: &[&str]) -> Vec<String> {
    let colored = highlighter.highlight(&lines.join("\n"), Language::Source);
    let mut out = colored
        .split('\n')
        .map(str::to_string)
        .collect::<Vec<_>>();
    out.resize(lines.len(), String::new());
    out
}
