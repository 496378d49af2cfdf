//! Alias syntax: `${band.path.param}` and `${param?transform}`
//!
//! Two regex tiers are used. The universal pattern is a cheap
//! presence check driving run merging and template-row detection; the
//! strict pattern splits a matched alias into its path, parameter and
//! optional transform. Text matching universally but failing strict
//! parsing is a syntax error wherever a substitution is required.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{FillError, Result};

static UNIVERSAL: OnceLock<Regex> = OnceLock::new();
static STRICT: OnceLock<Regex> = OnceLock::new();
static BAND_DECLARATION: OnceLock<Regex> = OnceLock::new();

/// Loose alias shape, used for presence checks and run merging
pub fn universal_pattern() -> &'static Regex {
    UNIVERSAL.get_or_init(|| {
        Regex::new(r"\$\{[\w.]+?(?:\?\w*(?:\([^()]*\))?)?\}").unwrap()
    })
}

/// Strict alias shape with capture groups for path and transform
pub fn strict_pattern() -> &'static Regex {
    STRICT.get_or_init(|| {
        Regex::new(r"\$\{([\w.]+?)(?:\?(\w*(?:\([^()]*\))?))?\}").unwrap()
    })
}

/// Table band marker: `##band=Name`
pub fn band_declaration_pattern() -> &'static Regex {
    BAND_DECLARATION.get_or_init(|| Regex::new(r"##band\s*=\s*(\w+)").unwrap())
}

/// A parsed alias occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasToken {
    /// Band path segments; empty means the contextual band
    pub band_path: Vec<String>,
    /// Parameter name, the last dot segment
    pub parameter_name: String,
    /// Raw transform expression after `?`, if any
    pub transform: Option<String>,
}

impl AliasToken {
    /// Parse the inner text of an alias (between `${` and `}`) plus
    /// its optional transform.
    pub fn parse(inner: &str, transform: Option<&str>) -> Result<Self> {
        let mut segments: Vec<String> = Vec::new();
        for segment in inner.split('.') {
            if segment.is_empty() {
                return Err(FillError::AliasSyntax(format!("${{{inner}}}")));
            }
            segments.push(segment.to_string());
        }
        let parameter_name = match segments.pop() {
            Some(name) => name,
            None => return Err(FillError::AliasSyntax(format!("${{{inner}}}"))),
        };
        Ok(Self {
            band_path: segments,
            parameter_name,
            transform: transform.map(|t| t.to_string()),
        })
    }

    /// Dotted band path for diagnostics
    pub fn path_str(&self) -> String {
        self.band_path.join(".")
    }
}

/// One alias occurrence in a text fragment
#[derive(Debug, Clone)]
pub struct AliasOccurrence {
    /// The full matched text, `${...}` inclusive
    pub full: String,
    /// The inner path text
    pub inner: String,
    /// The raw transform expression, if present
    pub transform: Option<String>,
}

/// Scan text for alias occurrences, in order
pub fn find_occurrences(text: &str) -> Vec<AliasOccurrence> {
    strict_pattern()
        .captures_iter(text)
        .map(|caps| AliasOccurrence {
            full: caps[0].to_string(),
            inner: caps[1].to_string(),
            transform: caps.get(2).map(|m| m.as_str().to_string()),
        })
        .collect()
}

/// Find a band declaration marker in text; returns the full matched
/// marker and the declared band name.
pub fn find_band_declaration(text: &str) -> Option<(String, String)> {
    band_declaration_pattern()
        .captures(text)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
}
