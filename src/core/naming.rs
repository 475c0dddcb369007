//! Model name normalization
//!
//! Turns a vendor folder name such as `60_Ghosts` or `22. Mimic` into the
//! canonical `<identifier>. <title>` form used for every output path.

use crate::core::error::{Result, SortError};
use crate::core::profile::{Delimiter, NamingRule};
use log::{debug, warn};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Canonical display name of a model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalName {
    /// Numeric identifier, when the naming rule provides one
    pub identifier: Option<u64>,
    /// Display title
    pub title: String,
}

impl CanonicalName {
    pub fn numbered(identifier: u64, title: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier),
            title: title.into(),
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            identifier: None,
            title: title.into(),
        }
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identifier {
            Some(id) => write!(f, "{}. {}", id, self.title),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Derive the canonical name of a raw folder name
pub fn normalize(raw: &str, rule: &NamingRule) -> Result<CanonicalName> {
    match rule {
        NamingRule::Numbered { delimiters } => normalize_numbered(raw, delimiters),
        NamingRule::Parenthesized { marker } => Ok(normalize_parenthesized(raw, marker)),
    }
}

fn normalize_numbered(raw: &str, delimiters: &[Delimiter]) -> Result<CanonicalName> {
    let mut last_reason = "no delimiter rules configured".to_string();

    for (index, delimiter) in delimiters.iter().enumerate() {
        if index > 0 {
            warn!(
                "Falling back to '{}' as delimiter to detect name of '{}'",
                delimiter.as_str(),
                raw
            );
        }
        match split_identifier(raw, *delimiter) {
            Ok(name) => {
                debug!("Normalized '{}' to '{}'", raw, name);
                return Ok(name);
            }
            Err(reason) => last_reason = reason,
        }
    }

    Err(SortError::NameFormat {
        raw: raw.to_string(),
        reason: last_reason,
    })
}

/// Split a raw name into a numeric identifier and a title
///
/// `_` must occur exactly once. `. ` splits at its first occurrence so titles
/// such as `Dr. Strange` survive a second normalization.
fn split_identifier(
    raw: &str,
    delimiter: Delimiter,
) -> std::result::Result<CanonicalName, String> {
    let separator = delimiter.as_str();
    let (left, title) = match delimiter {
        Delimiter::Underscore => {
            let parts: Vec<&str> = raw.split(separator).collect();
            if parts.len() != 2 {
                return Err(format!(
                    "expected exactly one '{}', found {}",
                    separator,
                    parts.len().saturating_sub(1)
                ));
            }
            (parts[0], parts[1])
        }
        Delimiter::DotSpace => raw
            .split_once(separator)
            .ok_or_else(|| format!("expected '{}' after the identifier", separator))?,
    };

    let identifier = left
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("identifier '{}' is not a number", left))?;

    Ok(CanonicalName::numbered(identifier, title))
}

fn paren_content() -> &'static Regex {
    static PAREN_CONTENT: OnceLock<Regex> = OnceLock::new();
    PAREN_CONTENT.get_or_init(|| Regex::new(r"\((.*?)\)").expect("valid regex"))
}

fn normalize_parenthesized(raw: &str, marker: &str) -> CanonicalName {
    let lower = raw.to_lowercase();
    if !lower.starts_with(&marker.to_lowercase()) {
        return CanonicalName::titled(capwords(raw));
    }

    match paren_content().captures(&lower).and_then(|c| c.get(1)) {
        Some(inner) => CanonicalName::titled(capwords(inner.as_str())),
        None => {
            warn!(
                "Failed to find parenthesized content for '{}' folder: {}",
                marker, raw
            );
            CanonicalName::titled(capwords(raw))
        }
    }
}

/// Capitalize every whitespace-separated word and join with single spaces
pub fn capwords(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
