//! Directives: one configuration key and the value it must carry

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The value of a directive.
///
/// Lists are rendered comma-joined, which is how OpenSSH spells algorithm
/// lists (`Ciphers a,b,c`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    Single(String),
    List(Vec<String>),
}

impl DirectiveValue {
    /// Render as it appears after the key on a config line.
    pub fn render(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::List(items) => items.join(","),
        }
    }

    fn tokens(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for DirectiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for DirectiveValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for DirectiveValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for DirectiveValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<&[&str]> for DirectiveValue {
    fn from(items: &[&str]) -> Self {
        Self::List(items.iter().map(|s| s.to_string()).collect())
    }
}

/// A single key/value assignment to enforce in a config file.
///
/// A disabled directive renders as a commented-out line
/// (`#key value # comment`), which keeps the setting visible to readers while
/// leaving the consuming service on its built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Config keyword, compared literally
    pub key: String,
    /// Desired value
    pub value: DirectiveValue,
    /// Render as a commented-out line
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Annotation appended to a disabled line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Directive {
    /// An enabled `key value` directive.
    pub fn set(key: impl Into<String>, value: impl Into<DirectiveValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            disabled: false,
            comment: None,
        }
    }

    /// A directive rendered as a commented-out line.
    pub fn disable(
        key: impl Into<String>,
        value: impl Into<DirectiveValue>,
        comment: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            disabled: true,
            comment,
        }
    }

    /// The full line this directive puts into the document.
    pub fn render(&self) -> String {
        let body = format!("{} {}", self.key, self.value.render());
        if !self.disabled {
            return body;
        }
        match self.comment.as_deref() {
            Some(comment) if !comment.trim().is_empty() => format!("#{body} # {}", comment.trim()),
            _ => format!("#{body}"),
        }
    }

    /// Reject directives that would not survive a round trip through a
    /// line-oriented file.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidDirective {
            key: self.key.clone(),
            reason: reason.to_string(),
        };

        if self.key.is_empty() {
            return Err(invalid("key is empty"));
        }
        if self.key.chars().any(char::is_whitespace) {
            return Err(invalid("key contains whitespace"));
        }
        if self.key.contains('#') || self.key.contains('=') {
            return Err(invalid("key contains '#' or '='"));
        }

        let tokens = self.value.tokens();
        if tokens.is_empty() || tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(invalid("value is empty"));
        }
        if tokens.iter().any(|t| t.contains(['\n', '\r'])) {
            return Err(invalid("value contains a line break"));
        }
        if self
            .comment
            .as_deref()
            .is_some_and(|c| c.contains(['\n', '\r']))
        {
            return Err(invalid("comment contains a line break"));
        }
        Ok(())
    }
}

/// Validate every directive and reject duplicate keys.
///
/// Runs before any file is touched.
pub fn validate_set(directives: &[Directive]) -> Result<()> {
    let mut seen = HashSet::new();
    for directive in directives {
        directive.validate()?;
        if !seen.insert(directive.key.as_str()) {
            return Err(Error::DuplicateDirective {
                key: directive.key.clone(),
            });
        }
    }
    Ok(())
}
