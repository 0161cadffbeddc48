//! In-memory model of a line-oriented `key value` config file
//!
//! Lines are kept exactly as read. Only the lines a directive addresses are
//! ever rewritten, so everything else (comments, `Match` blocks, text this
//! model does not understand) passes through untouched.

use std::fmt;

/// What a single raw line looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `key value`
    Directive { key: &'a str },
    /// `#key value`, possibly with a trailing `# comment`
    Disabled { key: &'a str },
    /// `# free text`
    Comment,
    /// Empty or whitespace only
    Blank,
    /// Anything else, e.g. a bare keyword
    Opaque,
}

impl<'a> LineKind<'a> {
    /// Classify a raw line.
    ///
    /// A line is keyed when its trimmed content is an optional `#`, a token,
    /// whitespace, and more text. The token is the key.
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }

        match trimmed.strip_prefix('#') {
            Some(rest) => match leading_key(rest) {
                Some(key) => Self::Disabled { key },
                None => Self::Comment,
            },
            None => match leading_key(trimmed) {
                Some(key) => Self::Directive { key },
                None => Self::Opaque,
            },
        }
    }

    /// The key of a directive or disabled directive line.
    pub fn key(&self) -> Option<&'a str> {
        match *self {
            Self::Directive { key } | Self::Disabled { key } => Some(key),
            _ => None,
        }
    }
}

/// Split `text` into `(key, rest)` when it starts with a token followed by
/// whitespace and a non-empty remainder.
fn leading_key(text: &str) -> Option<&str> {
    let split = text.find(char::is_whitespace)?;
    if split == 0 {
        return None;
    }
    let (key, rest) = text.split_at(split);
    if rest.trim().is_empty() {
        None
    } else {
        Some(key)
    }
}

/// An ordered sequence of raw config lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl ConfigDocument {
    /// Parse text into lines.
    ///
    /// Splits on `\n` only; a `\r` before it stays part of the line, so an
    /// untouched CRLF file renders back unchanged. Lines written by the
    /// reconciler follow [`uses_crlf`](Self::uses_crlf).
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }

        let trailing_newline = text.ends_with('\n');
        let body = if trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };

        Self {
            lines: body.split('\n').map(str::to_string).collect(),
            trailing_newline,
        }
    }

    /// All lines in order, without their `\n`.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line carries a CRLF terminator.
    pub fn uses_crlf(&self) -> bool {
        self.lines.iter().any(|line| line.ends_with('\r'))
    }

    /// Line at `index`, if any.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Index of the first line keyed by `key`, enabled or disabled.
    ///
    /// Keys compare exactly. Later lines with the same key are never
    /// returned.
    pub fn find_key(&self, key: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| LineKind::classify(line).key() == Some(key))
    }

    /// Replace the line at `index`, returning the previous text.
    ///
    /// Returns `None` and leaves the document alone if `index` is out of
    /// range.
    pub fn replace(&mut self, index: usize, line: String) -> Option<String> {
        let slot = self.lines.get_mut(index)?;
        Some(std::mem::replace(slot, line))
    }

    /// Append a line at the end, returning its index.
    pub fn push(&mut self, line: String) -> usize {
        self.lines.push(line);
        self.trailing_newline = true;
        self.lines.len() - 1
    }

    /// Render back to text.
    ///
    /// An untouched document renders byte-for-byte as it was parsed. Once a
    /// line has been appended the output always ends with a newline.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
